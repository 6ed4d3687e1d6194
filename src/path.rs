//! Working-directory path algebra.
//!
//! Sessions keep their current directory as a plain string with a fixed
//! capacity (the back-end's maximum long file name plus slack). Commands
//! build target paths in place and restore them afterwards with
//! [`up_one`], so everything here must stay total: the only failure mode
//! is "does not fit".

/// Maximum length of a working-directory or argument string. Matches the
/// long-file-name bound of FAT-family back-ends (255) plus slack.
pub(crate) const PATH_CAPACITY: usize = 255 + 8;

/// Remove the trailing segment of `path`, up to and including the last
/// `/`. The root path is left unchanged.
pub(crate) fn up_one(path: &mut String) {
    if let Some(idx) = path.rfind('/') {
        path.truncate(idx + 1);
        if path.len() > 1 {
            path.pop();
        }
    }
}

/// Build a new working path from `cwd` and a client-supplied argument.
///
/// Cases, in order: `""`/`"/"` resets to the root, `".."` goes up one
/// level, an absolute argument replaces the path, anything else is
/// appended as a segment. A trailing `/` is dropped unless the result is
/// the root itself.
///
/// Returns `true` and commits the result iff it fits [`PATH_CAPACITY`];
/// on overflow `cwd` is left untouched. `scratch` is the session's
/// reusable work buffer.
pub(crate) fn build(cwd: &mut String, arg: &str, scratch: &mut String) -> bool {
    scratch.clear();
    scratch.push_str(cwd);

    if arg.is_empty() || arg == "/" {
        scratch.clear();
        scratch.push('/');
    } else if arg == ".." {
        up_one(scratch);
    } else if !arg.starts_with('/') {
        if !scratch.ends_with('/') {
            scratch.push('/');
        }
        scratch.push_str(arg);
    } else {
        scratch.clear();
        scratch.push_str(arg);
    }

    if scratch.len() > 1 && scratch.ends_with('/') {
        scratch.pop();
    }

    if scratch.len() >= PATH_CAPACITY {
        return false;
    }
    cwd.clear();
    cwd.push_str(scratch);
    true
}
