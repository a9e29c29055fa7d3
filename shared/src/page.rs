use crate::config::SwitcherConfig;

/// Prefixes of an active game session and its results view.
const PRIMARY_MODES: &[&str] = &["/game/", "/results/"];

/// Competitive modes, only customized when `extended_modes` is on.
const EXTENDED_MODES: &[&str] = &[
    "/challenge/",
    "/battle-royale/",
    "/duels/",
    "/team-duels/",
    "/bullseye/",
    "/live-challenge/",
];

/// Strip a leading two-letter locale segment: `/fr/game/x` becomes `/game/x`.
pub fn strip_locale_prefix(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 4
        && bytes[0] == b'/'
        && bytes[1].is_ascii_alphabetic()
        && bytes[2].is_ascii_alphabetic()
        && bytes[3] == b'/'
    {
        &path[3..]
    } else {
        path
    }
}

/// Whether maps on this navigation path should be customized.
pub fn is_enforced_page(path: &str, config: &SwitcherConfig) -> bool {
    let path = strip_locale_prefix(path);
    let primary = PRIMARY_MODES.iter().any(|prefix| path.starts_with(prefix));
    if primary || !config.extended_modes {
        return primary;
    }
    EXTENDED_MODES.iter().any(|prefix| path.starts_with(prefix))
}

/// Source of the current navigation path, read on demand.
pub trait PathSource {
    fn current_path(&self) -> String;
}

impl<F> PathSource for F
where
    F: Fn() -> String,
{
    fn current_path(&self) -> String {
        self()
    }
}
