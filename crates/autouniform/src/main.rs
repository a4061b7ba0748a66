use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};

use autouniform::pipeline::ItemReport;
use autouniform::project::ProjectFile;
use autouniform::settings::SettingsConfig;
use autouniform::watcher::ShaderWatcher;
use autouniform::{NagaReflector, Pipeline, UniformReconciler};

const USAGE: &str = "usage: autouniform [--write] [--watch] <project.json>";

struct Args {
    project: PathBuf,
    write: bool,
    watch: bool,
}

fn parse_args() -> Result<Args> {
    let mut project = None;
    let mut write = false;
    let mut watch = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--write" => write = true,
            "--watch" => watch = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            path => {
                if project.replace(PathBuf::from(path)).is_some() {
                    bail!("only one project file can be given\n{USAGE}");
                }
            }
        }
    }
    let Some(project) = project else {
        bail!("{USAGE}");
    };
    Ok(Args {
        project,
        write,
        watch,
    })
}

fn log_reports(reports: &[ItemReport]) {
    for report in reports {
        for name in &report.added {
            log::info!("[{}] + {name}", report.item);
        }
        for name in &report.removed {
            log::info!("[{}] - {name}", report.item);
        }
        if !report.pruned {
            log::debug!("[{}] unused variables kept (not every stage reflected)", report.item);
        }
    }
}

fn reconcile_all(pipeline: &mut Pipeline, reflector: &NagaReflector, reconciler: &UniformReconciler) {
    let names: Vec<String> = pipeline.items.iter().map(|i| i.name.clone()).collect();
    for name in &names {
        pipeline.mark_dirty(name);
    }
    log_reports(&pipeline.process_reflection_queue(reflector, reconciler));
}

fn emit(project: &mut ProjectFile, pipeline: &Pipeline, args: &Args) -> Result<()> {
    project.update_from_pipeline(pipeline);
    if args.write {
        project.save(&args.project)?;
        log::info!("Wrote {}", args.project.display());
    } else {
        println!("{}", project.to_json()?);
    }
    Ok(())
}

fn watch(
    project: &mut ProjectFile,
    pipeline: &mut Pipeline,
    base_dir: &Path,
    settings: &SettingsConfig,
    reflector: &NagaReflector,
    reconciler: &UniformReconciler,
    args: &Args,
) -> Result<()> {
    let stage_paths = project.stage_paths(base_dir);
    let watcher = ShaderWatcher::new(stage_paths.iter().map(|(_, p)| p.as_path()))
        .context("failed to start shader watcher")?;

    loop {
        let changed = watcher.wait_changes(Duration::from_millis(250));
        if changed.is_empty() {
            continue;
        }
        for (pass, path) in &stage_paths {
            if changed.iter().any(|c| ShaderWatcher::is_same_file(c, path))
                && !pipeline.pending().contains(pass)
            {
                log::info!("{} changed, re-reflecting '{pass}'", path.display());
                project.reload_pass(pipeline, pass, base_dir, settings);
                pipeline.mark_dirty(pass);
            }
        }
        log_reports(&pipeline.process_reflection_queue(reflector, reconciler));
        emit(project, pipeline, args)?;
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args()?;
    let settings = SettingsConfig::load();
    let reconciler = settings.reconciler();
    let reflector = NagaReflector::new();

    let mut project = ProjectFile::load(&args.project)?;
    let base_dir = args
        .project
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut pipeline = project.to_pipeline(&base_dir, &settings);
    reconcile_all(&mut pipeline, &reflector, &reconciler);
    emit(&mut project, &pipeline, &args)?;

    if args.watch {
        watch(
            &mut project,
            &mut pipeline,
            &base_dir,
            &settings,
            &reflector,
            &reconciler,
            &args,
        )?;
    }
    Ok(())
}
