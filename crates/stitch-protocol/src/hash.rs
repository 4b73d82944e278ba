//! Compile-time file hashing.
//!
//! Each injected call site carries a 32-bit FNV-1a hash of its source file's
//! *basename*, baked in at transform time. Compile-time paths are absolute
//! while breakpoint-file paths are usually workspace-relative; matching on
//! the basename avoids a runtime path-normalisation step. A hash of the
//! entry's full path is accepted as a fallback so UIs may also write
//! absolute paths.

/// FNV-1a 32-bit offset basis.
pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;

/// FNV-1a 32-bit prime.
pub const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a over raw bytes.
#[must_use]
pub fn fnv1a_32(data: &[u8]) -> u32 {
    data.iter()
        .fold(FNV_OFFSET_BASIS, |hash, b| (hash ^ u32::from(*b)).wrapping_mul(FNV_PRIME))
}

/// Final path component, accepting both `/` and `\` separators.
#[must_use]
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// The hash a transformed call site carries for `path`.
#[must_use]
pub fn file_hash(path: &str) -> u32 {
    fnv1a_32(basename(path).as_bytes())
}

/// Whether a breakpoint entry's `file` field matches a call site's hash:
/// basename hash first, full-path hash as fallback.
#[must_use]
pub fn hash_matches(entry_file: &str, call_site_hash: u32) -> bool {
    file_hash(entry_file) == call_site_hash
        || fnv1a_32(entry_file.as_bytes()) == call_site_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_reference_vectors() {
        // Published FNV-1a 32 test vectors.
        assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a_32(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("src/main.rs"), "main.rs");
        assert_eq!(basename("main.rs"), "main.rs");
        assert_eq!(basename("/abs/path/to/lib.rs"), "lib.rs");
        assert_eq!(basename(r"c:\work\mod.rs"), "mod.rs");
    }

    #[test]
    fn test_hash_matches_by_basename() {
        let call_site = file_hash("/home/user/project/src/main.rs");
        assert!(hash_matches("src/main.rs", call_site));
        assert!(hash_matches("main.rs", call_site));
        assert!(!hash_matches("src/other.rs", call_site));
    }

    #[test]
    fn test_hash_matches_full_path_fallback() {
        // A UI that writes full paths still matches a call site that hashed
        // the same full string.
        let call_site = fnv1a_32(b"/opt/app/src/main.rs");
        assert!(hash_matches("/opt/app/src/main.rs", call_site));
    }
}
