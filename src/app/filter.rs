use std::ffi::OsStr;

/// Allow-list of file extensions, compared case-sensitively and byte-exact.
#[derive(Debug, Clone, Default)]
pub struct ExtensionFilter {
    allowed: Vec<String>,
}

impl ExtensionFilter {
    pub fn new(allowed: &[String]) -> Self {
        Self {
            allowed: allowed.to_vec(),
        }
    }

    /// An empty allow-list admits every regular file.
    pub fn is_bypassed(&self) -> bool {
        self.allowed.is_empty()
    }

    /// True if the part after the last `.` of `name` is in the allow-list.
    pub fn has_extension(&self, name: &OsStr) -> bool {
        let bytes = name.as_encoded_bytes();
        let Some(dot) = bytes.iter().rposition(|&b| b == b'.') else {
            return false;
        };
        let ext = &bytes[dot + 1..];
        self.allowed.iter().any(|allowed| allowed.as_bytes() == ext)
    }

    pub fn admits(&self, name: &OsStr) -> bool {
        self.is_bypassed() || self.has_extension(name)
    }
}
