/// How pending files are packaged for `/api/upload`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMode {
    /// One file per request, multipart field `file`
    Single,
    /// All pending files in one request, repeated field `files`
    #[default]
    Multi,
}

impl UploadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadMode::Single => "single",
            UploadMode::Multi => "multi",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single" => Some(UploadMode::Single),
            "multi" => Some(UploadMode::Multi),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UploadMode::Single => "Single file",
            UploadMode::Multi => "Multiple files",
        }
    }

    /// Multipart field name the backend expects for each file
    pub fn field_name(&self) -> &'static str {
        match self {
            UploadMode::Single => "file",
            UploadMode::Multi => "files",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            UploadMode::Single => UploadMode::Multi,
            UploadMode::Multi => UploadMode::Single,
        }
    }
}

/// Whether the accumulated transcript is sent along with each question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatMode {
    SingleTurn,
    #[default]
    MultiTurn,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::SingleTurn => "single-turn",
            ChatMode::MultiTurn => "multi-turn",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single-turn" | "single" => Some(ChatMode::SingleTurn),
            "multi-turn" | "multi" => Some(ChatMode::MultiTurn),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ChatMode::SingleTurn => "Single question",
            ChatMode::MultiTurn => "Conversation",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            ChatMode::SingleTurn => ChatMode::MultiTurn,
            ChatMode::MultiTurn => ChatMode::SingleTurn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_mode_round_trips_through_str() {
        for mode in [UploadMode::Single, UploadMode::Multi] {
            assert_eq!(UploadMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(UploadMode::from_str("MULTI"), Some(UploadMode::Multi));
        assert_eq!(UploadMode::from_str("batch"), None);
    }

    #[test]
    fn test_field_names() {
        assert_eq!(UploadMode::Single.field_name(), "file");
        assert_eq!(UploadMode::Multi.field_name(), "files");
    }

    #[test]
    fn test_chat_mode_aliases() {
        assert_eq!(ChatMode::from_str("single"), Some(ChatMode::SingleTurn));
        assert_eq!(ChatMode::from_str("Multi-Turn"), Some(ChatMode::MultiTurn));
        assert_eq!(ChatMode::default().toggle(), ChatMode::SingleTurn);
    }
}
