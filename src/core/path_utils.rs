/*
 * Path helpers shared by the core: locating the platform-specific local
 * configuration directory and rendering paths with forward slashes for
 * bundle labels and stored thumbnail paths.
 */
use directories::ProjectDirs;
use std::path::{Component, Path, PathBuf};

/*
 * Retrieves the application's local (non-roaming) configuration directory,
 * e.g. `~/.config/<app>` on Linux or `AppData/Local/<app>/config` on Windows.
 * Unlike a writer, the bundler only ever reads from here, so the directory is
 * not created.
 *
 * Returns `None` if `ProjectDirs` cannot determine a home directory.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Resolving base app config local dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).map(|proj_dirs| proj_dirs.config_local_dir().to_path_buf())
}

/*
 * Renders `path` relative to `base`, joining components with '/' regardless
 * of platform. Returns `None` if `path` is not below `base`.
 */
pub fn relative_forward_slash(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}
