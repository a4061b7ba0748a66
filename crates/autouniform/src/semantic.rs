use rustc_hash::FxHashMap;

use crate::variable::{SystemSemantic, ValueType};

/// Maps a variable name onto an engine-provided value source.
pub trait SemanticResolver {
    fn resolve(&self, name: &str, value_type: ValueType) -> Option<SystemSemantic>;
}

/// Prefixes commonly put in front of engine uniform names (`iTime`, `u_time`, `sysTime`).
const NAME_PREFIXES: &[&str] = &["sys", "u", "i", "g"];

/// Built-in aliases, keyed by normalised name. Candidates are tried in order.
const DEFAULT_ALIASES: &[(&str, &[SystemSemantic])] = &[
    ("time", &[SystemSemantic::Time]),
    ("globaltime", &[SystemSemantic::Time]),
    ("elapsedtime", &[SystemSemantic::Time]),
    ("timedelta", &[SystemSemantic::TimeDelta]),
    ("deltatime", &[SystemSemantic::TimeDelta]),
    ("frametime", &[SystemSemantic::TimeDelta]),
    ("frame", &[SystemSemantic::FrameIndex]),
    ("frameindex", &[SystemSemantic::FrameIndex]),
    ("resolution", &[SystemSemantic::ViewportSize]),
    ("viewport", &[SystemSemantic::ViewportSize]),
    ("viewportsize", &[SystemSemantic::ViewportSize]),
    ("mouse", &[SystemSemantic::Mouse, SystemSemantic::MousePosition]),
    ("mousepos", &[SystemSemantic::MousePosition]),
    ("mouseposition", &[SystemSemantic::MousePosition]),
    ("view", &[SystemSemantic::View]),
    ("viewmatrix", &[SystemSemantic::View]),
    ("proj", &[SystemSemantic::Projection]),
    ("projection", &[SystemSemantic::Projection]),
    ("projectionmatrix", &[SystemSemantic::Projection]),
    ("viewproj", &[SystemSemantic::ViewProjection]),
    ("viewprojection", &[SystemSemantic::ViewProjection]),
    ("ortho", &[SystemSemantic::Orthographic]),
    ("orthographic", &[SystemSemantic::Orthographic]),
    ("viewortho", &[SystemSemantic::ViewOrthographic]),
    ("vieworthographic", &[SystemSemantic::ViewOrthographic]),
    ("model", &[SystemSemantic::GeometryTransform]),
    ("world", &[SystemSemantic::GeometryTransform]),
    ("geometrytransform", &[SystemSemantic::GeometryTransform]),
    ("picked", &[SystemSemantic::IsPicked]),
    ("ispicked", &[SystemSemantic::IsPicked]),
    (
        "campos",
        &[SystemSemantic::CameraPosition, SystemSemantic::CameraPosition3],
    ),
    (
        "camerapos",
        &[SystemSemantic::CameraPosition, SystemSemantic::CameraPosition3],
    ),
    (
        "cameraposition",
        &[SystemSemantic::CameraPosition, SystemSemantic::CameraPosition3],
    ),
    ("camdir", &[SystemSemantic::CameraDirection3]),
    ("cameradir", &[SystemSemantic::CameraDirection3]),
    ("cameradirection", &[SystemSemantic::CameraDirection3]),
    ("keys", &[SystemSemantic::KeysWasd]),
    ("wasd", &[SystemSemantic::KeysWasd]),
    ("keyswasd", &[SystemSemantic::KeysWasd]),
    ("pickpos", &[SystemSemantic::PickPosition]),
    ("pickposition", &[SystemSemantic::PickPosition]),
    ("issavingtofile", &[SystemSemantic::IsSavingToFile]),
    ("savingtofile", &[SystemSemantic::IsSavingToFile]),
];

/// Lower-case and drop underscores so `u_deltaTime` and `uDeltaTime` compare equal.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolves semantics by matching the variable name against an alias table.
pub struct NameSemanticResolver {
    aliases: FxHashMap<String, Vec<SystemSemantic>>,
}

impl NameSemanticResolver {
    pub fn new() -> Self {
        let aliases = DEFAULT_ALIASES
            .iter()
            .map(|(alias, semantics)| ((*alias).to_string(), semantics.to_vec()))
            .collect();
        Self { aliases }
    }

    /// Add aliases on top of the built-in table. User aliases are tried first.
    ///
    /// Aliases are applied in sorted order, so when two of them normalise to the
    /// same key the one that sorts last takes priority.
    pub fn with_aliases<'a>(
        mut self,
        extra: impl IntoIterator<Item = (&'a String, &'a SystemSemantic)>,
    ) -> Self {
        let mut extra: Vec<_> = extra.into_iter().collect();
        extra.sort_by_key(|(alias, _)| *alias);
        for (alias, semantic) in extra {
            let candidates = self.aliases.entry(normalize(alias)).or_default();
            candidates.retain(|s| s != semantic);
            candidates.insert(0, *semantic);
        }
        self
    }

    fn lookup(&self, key: &str, value_type: ValueType) -> Option<SystemSemantic> {
        self.aliases
            .get(key)?
            .iter()
            .copied()
            .find(|s| s.value_type() == value_type)
    }
}

impl Default for NameSemanticResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticResolver for NameSemanticResolver {
    fn resolve(&self, name: &str, value_type: ValueType) -> Option<SystemSemantic> {
        let key = normalize(name);
        if let Some(semantic) = self.lookup(&key, value_type) {
            return Some(semantic);
        }
        NAME_PREFIXES.iter().find_map(|prefix| {
            let rest = key.strip_prefix(prefix)?;
            if rest.is_empty() {
                return None;
            }
            self.lookup(rest, value_type)
        })
    }
}
