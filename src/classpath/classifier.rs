// src/classpath/classifier.rs

//! Entry classification based on relative path patterns
//!
//! Every regular entry found on the classpath falls into exactly one bucket.
//! Class payloads go to the rewrite engine, transformer scripts are registered
//! with it, and everything else is copied through untouched.

/// File name suffix of compiled class payloads
pub const CLASS_SUFFIX: &str = ".class";

/// File name suffix of transformer scripts
pub const SCRIPT_SUFFIX: &str = ".chasm";

/// Reserved namespace under which transformer scripts are auto-discovered
pub const TRANSFORMER_NAMESPACE: &str = "org/quiltmc/chasm/transformers/";

/// Kind of a classpath entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Compiled class payload, handed to the rewrite engine
    Class,
    /// Transformer script under the reserved namespace
    ///
    /// Scripts are registered with the engine *and* copied to the output like
    /// any other resource.
    TransformerScript,
    /// Anything else; copied byte-for-byte
    Resource,
}

impl EntryKind {
    /// Get the string representation of the entry kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::TransformerScript => "transformer",
            Self::Resource => "resource",
        }
    }

    /// Whether entries of this kind are copied to the output verbatim
    pub fn is_copied(&self) -> bool {
        matches!(self, Self::TransformerScript | Self::Resource)
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies classpath entries by their relative path
///
/// Paths are `/`-separated and relative to their classpath element, the same
/// form archives store entry names in.
pub struct EntryClassifier;

impl EntryClassifier {
    /// Classify a relative path
    ///
    /// Order of checks matters: a `.class` file is a class even inside the
    /// transformer namespace.
    pub fn classify(relative_path: &str) -> EntryKind {
        let file_name = file_name(relative_path);

        if file_name.ends_with(CLASS_SUFFIX) {
            return EntryKind::Class;
        }

        if relative_path.starts_with(TRANSFORMER_NAMESPACE) && file_name.ends_with(SCRIPT_SUFFIX) {
            return EntryKind::TransformerScript;
        }

        EntryKind::Resource
    }
}

/// Last `/`-separated component of a relative path
fn file_name(relative_path: &str) -> &str {
    relative_path
        .rsplit_once('/')
        .map_or(relative_path, |(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_class() {
        assert_eq!(EntryClassifier::classify("Foo.class"), EntryKind::Class);
        assert_eq!(
            EntryClassifier::classify("com/example/Foo$Inner.class"),
            EntryKind::Class
        );
    }

    #[test]
    fn test_classify_class_inside_transformer_namespace() {
        assert_eq!(
            EntryClassifier::classify("org/quiltmc/chasm/transformers/Helper.class"),
            EntryKind::Class
        );
    }

    #[test]
    fn test_classify_transformer_script() {
        assert_eq!(
            EntryClassifier::classify("org/quiltmc/chasm/transformers/add_field.chasm"),
            EntryKind::TransformerScript
        );
        assert_eq!(
            EntryClassifier::classify("org/quiltmc/chasm/transformers/nested/deep/x.chasm"),
            EntryKind::TransformerScript
        );
    }

    #[test]
    fn test_script_outside_namespace_is_resource() {
        assert_eq!(
            EntryClassifier::classify("other/add_field.chasm"),
            EntryKind::Resource
        );
        assert_eq!(
            EntryClassifier::classify("org/quiltmc/chasm/add_field.chasm"),
            EntryKind::Resource
        );
        // The namespace must be a path prefix, not a substring
        assert_eq!(
            EntryClassifier::classify("x/org/quiltmc/chasm/transformers/a.chasm"),
            EntryKind::Resource
        );
    }

    #[test]
    fn test_wrong_suffix_in_namespace_is_resource() {
        assert_eq!(
            EntryClassifier::classify("org/quiltmc/chasm/transformers/README.md"),
            EntryKind::Resource
        );
    }

    #[test]
    fn test_classify_resources() {
        assert_eq!(EntryClassifier::classify("README.md"), EntryKind::Resource);
        assert_eq!(
            EntryClassifier::classify("META-INF/MANIFEST.MF"),
            EntryKind::Resource
        );
        // Suffix check is on the file name, not a directory component
        assert_eq!(
            EntryClassifier::classify("weird.class/data.bin"),
            EntryKind::Resource
        );
    }

    #[test]
    fn test_is_copied() {
        assert!(!EntryKind::Class.is_copied());
        assert!(EntryKind::TransformerScript.is_copied());
        assert!(EntryKind::Resource.is_copied());
    }
}
