//! Utility functions for deriving Scala identifiers from protobuf names.

/// Scala reserved words. Identifiers matching one of these are wrapped in
/// back-ticks, the escaping Scala itself provides.
static SCALA_KEYWORDS: &[&str] = &[
    "abstract", "case", "catch", "class", "def", "do", "else", "extends", "false", "final",
    "finally", "for", "forSome", "if", "implicit", "import", "lazy", "macro", "match", "new",
    "null", "object", "override", "package", "private", "protected", "return", "sealed", "super",
    "then", "this", "throw", "trait", "true", "try", "type", "val", "var", "while", "with",
    "yield",
];

/// Method names every generated message already carries. A field whose
/// camel-cased accessor would collide with one of these gets a trailing
/// underscore appended.
static RESERVED_ACCESSORS: &[&str] = &[
    "clone",
    "companion",
    "copy",
    "equals",
    "finalize",
    "getClass",
    "getField",
    "getFieldByNumber",
    "hashCode",
    "notify",
    "notifyAll",
    "productArity",
    "productPrefix",
    "serializedSize",
    "toByteArray",
    "toString",
    "wait",
    "writeTo",
];

/// Converts a lower_snake_case protobuf field name to a lowerCamelCase Scala
/// accessor name.
pub fn to_lower_camel(snake: &str) -> String {
    // protoc does not allow non-ascii identifiers.
    let mut ident = String::with_capacity(snake.len());
    let mut capitalize_next = false;

    for &c in snake.as_bytes() {
        if c == b'_' {
            if ident.is_empty() {
                ident.push('_');
            } else {
                capitalize_next = true;
            }
        } else if capitalize_next {
            ident.push(to_uppercase(c) as char);
            capitalize_next = false;
        } else {
            ident.push(c as char);
        }
    }
    if capitalize_next {
        ident.push('_');
    }
    ident
}

/// Converts a snake_case or lowerCamelCase identifier to an UpperCamelCase
/// Scala type identifier.
pub fn to_upper_camel(snake: &str) -> String {
    let mut ident = String::with_capacity(snake.len());

    // split("") yields one empty fragment, which would read as a leading
    // underscore below
    if snake.is_empty() {
        return ident;
    }

    for fragment in snake.split('_') {
        if fragment.is_empty() {
            ident.push('_');
        } else {
            let (first, rest) = fragment.as_bytes().split_first().unwrap();
            ident.push(to_uppercase(*first) as char);
            ident.extend(rest.iter().map(|&c| c as char));
        }
    }
    ident
}

/// Wraps the identifier in back-ticks when it is a Scala reserved word.
pub fn escape_keyword(ident: String) -> String {
    if SCALA_KEYWORDS.contains(&ident.as_str()) {
        format!("`{}`", ident)
    } else {
        ident
    }
}

/// Derives the Scala accessor name for a protobuf field: camel-cased,
/// de-conflicted from generated method names by a trailing underscore, then
/// keyword-escaped.
pub fn field_accessor(proto_name: &str) -> String {
    let mut ident = to_lower_camel(proto_name);
    if RESERVED_ACCESSORS.contains(&ident.as_str()) {
        ident.push('_');
    }
    escape_keyword(ident)
}

/// Name of the per-file companion object: `foo_services.proto` becomes
/// `FooServicesProto`.
pub fn file_object_name(proto_file_name: &str) -> String {
    let base = proto_file_name
        .rsplit('/')
        .next()
        .unwrap()
        .trim_end_matches(".proto");
    format!("{}Proto", to_upper_camel(base))
}

/// Base name of a proto file, used as the per-file package suffix:
/// `a/b/foo_bar.proto` becomes `foo_bar`.
pub fn file_package_segment(proto_file_name: &str) -> String {
    proto_file_name
        .rsplit('/')
        .next()
        .unwrap()
        .trim_end_matches(".proto")
        .to_string()
}

#[inline]
fn to_uppercase(c: u8) -> u8 {
    if c.is_ascii_lowercase() {
        c - 32
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_lower_camel() {
        assert_eq!("fooBar", &to_lower_camel("foo_bar"));
        assert_eq!("fooBarBaz", &to_lower_camel("foo_bar_baz"));
        assert_eq!("foo", &to_lower_camel("foo"));
        assert_eq!("fooBar", &to_lower_camel("fooBar"));
        assert_eq!("_fooBar", &to_lower_camel("_foo_bar"));
        assert_eq!("foo_", &to_lower_camel("foo_"));
        assert_eq!("fooBar_", &to_lower_camel("foo_bar_"));
        assert_eq!("foo2Bar", &to_lower_camel("foo2_bar"));

        // From test_messages_proto3.proto.
        assert_eq!("fieldname1", &to_lower_camel("fieldname1"));
        assert_eq!("fieldName2", &to_lower_camel("field_name2"));
        assert_eq!("field0name5", &to_lower_camel("field0name5"));
        assert_eq!("field0Name6", &to_lower_camel("field_0_name6"));
    }

    #[test]
    fn test_to_upper_camel() {
        assert_eq!("", &to_upper_camel(""));
        assert_eq!("F", &to_upper_camel("f"));
        assert_eq!("Foo", &to_upper_camel("foo"));
        assert_eq!("FooBar", &to_upper_camel("foo_bar"));
        assert_eq!("_FooBar", &to_upper_camel("_foo_bar"));
        assert_eq!("FooBar_", &to_upper_camel("foo_bar_"));
        assert_eq!("FooBar", &to_upper_camel("FooBar"));
        assert_eq!("Point3d", &to_upper_camel("point3d"));
    }

    #[test]
    fn test_escape_keyword() {
        assert_eq!("`type`", &escape_keyword("type".to_string()));
        assert_eq!("`object`", &escape_keyword("object".to_string()));
        assert_eq!("`lazy`", &escape_keyword("lazy".to_string()));
        assert_eq!("kind", &escape_keyword("kind".to_string()));
    }

    #[test]
    fn test_field_accessor() {
        assert_eq!("fooBar", &field_accessor("foo_bar"));
        assert_eq!("`type`", &field_accessor("type"));
        assert_eq!("`val`", &field_accessor("val"));
        // collides with the generated size accessor
        assert_eq!("serializedSize_", &field_accessor("serialized_size"));
        assert_eq!("toString_", &field_accessor("to_string"));
        assert_eq!("companion_", &field_accessor("companion"));
    }

    #[test]
    fn test_file_object_name() {
        assert_eq!("FooProto", &file_object_name("foo.proto"));
        assert_eq!("FooBarProto", &file_object_name("a/b/foo_bar.proto"));
        assert_eq!("Point3dProto", &file_object_name("point3d.proto"));
    }

    #[test]
    fn test_file_package_segment() {
        assert_eq!("foo", &file_package_segment("foo.proto"));
        assert_eq!("foo_bar", &file_package_segment("a/b/foo_bar.proto"));
    }
}
