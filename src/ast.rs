use prost_types::source_code_info::Location;

/// Comments on a protobuf item.
#[derive(Debug, Default)]
pub struct Comments {
    /// Leading detached blocks of comments.
    pub leading_detached: Vec<Vec<String>>,

    /// Leading comments.
    pub leading: Vec<String>,

    /// Trailing comments.
    pub trailing: Vec<String>,
}

impl Comments {
    pub(crate) fn from_location(location: &Location) -> Comments {
        fn get_lines(comments: &str) -> Vec<String> {
            comments.lines().map(str::to_owned).collect()
        }

        let leading_detached = location
            .leading_detached_comments
            .iter()
            .map(|comment| get_lines(comment))
            .collect();
        let leading = location
            .leading_comments
            .as_deref()
            .map_or(Vec::new(), get_lines);
        let trailing = location
            .trailing_comments
            .as_deref()
            .map_or(Vec::new(), get_lines);
        Comments {
            leading_detached,
            leading,
            trailing,
        }
    }

    /// Renders the leading comments as a Scaladoc block, or nothing when
    /// there are none.
    pub fn to_scaladoc(&self) -> Option<String> {
        scaladoc(&self.leading)
    }
}

/// Renders comment lines as a Scaladoc block; `None` when there are none.
pub(crate) fn scaladoc(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    let mut doc = String::from("/**");
    for line in lines {
        doc.push('\n');
        doc.push_str("  *");
        if !line.is_empty() {
            doc.push_str(line);
        }
    }
    doc.push_str("\n  */");
    Some(doc)
}

/// A service descriptor resolved for the external stub printer.
#[derive(Debug)]
pub struct Service {
    /// The Scala object name of the service.
    pub name: String,
    /// The service name as it appears in the descriptor.
    pub proto_name: String,
    /// The proto package of the defining file.
    pub package: String,
    /// The service comments.
    pub comments: Comments,
    /// The service methods.
    pub methods: Vec<Method>,
    /// The service options.
    pub options: prost_types::ServiceOptions,
}

/// A service method descriptor.
#[derive(Debug)]
pub struct Method {
    /// The Scala method name.
    pub name: String,
    /// The method name as it appears in the descriptor.
    pub proto_name: String,
    /// The method comments.
    pub comments: Comments,
    /// The input Scala type.
    pub input_type: String,
    /// The output Scala type.
    pub output_type: String,
    /// The input protobuf type.
    pub input_proto_type: String,
    /// The output protobuf type.
    pub output_proto_type: String,
    /// The method options.
    pub options: prost_types::MethodOptions,
    /// Identifies if client streams multiple client messages.
    pub client_streaming: bool,
    /// Identifies if server streams multiple server messages.
    pub server_streaming: bool,
}
