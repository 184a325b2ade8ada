/// The declared syntax of a schema file. Presence tracking and packing
/// defaults hang off it, so the field-level queries ask the syntax rather
/// than re-deriving the rules at each site.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Syntax {
    Proto2,
    Proto3,
}

impl Syntax {
    /// protoc omits the `syntax` field entirely for legacy proto2 files.
    pub fn from_declaration(declaration: Option<&str>) -> Syntax {
        match declaration {
            None | Some("proto2") => Syntax::Proto2,
            Some("proto3") => Syntax::Proto3,
            Some(other) => panic!("unknown syntax: {}", other),
        }
    }

    /// Whether a plain optional scalar distinguishes unset from default.
    /// proto3 scalars need an explicit `optional` (a synthetic oneof) for
    /// that.
    pub fn scalars_track_presence(self) -> bool {
        self == Syntax::Proto2
    }

    /// Whether packable repeated fields use the packed encoding when the
    /// schema does not say otherwise.
    pub fn packs_by_default(self) -> bool {
        self == Syntax::Proto3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_declaration() {
        assert_eq!(Syntax::from_declaration(None), Syntax::Proto2);
        assert_eq!(Syntax::from_declaration(Some("proto2")), Syntax::Proto2);
        assert_eq!(Syntax::from_declaration(Some("proto3")), Syntax::Proto3);
    }

    #[test]
    fn test_defaults_flip_between_syntaxes() {
        assert!(Syntax::Proto2.scalars_track_presence());
        assert!(!Syntax::Proto2.packs_by_default());
        assert!(!Syntax::Proto3.scalars_track_presence());
        assert!(Syntax::Proto3.packs_by_default());
    }
}
