use thiserror::Error;

/// Result type alias for generator operations.
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Domain errors raised during generation.
///
/// Every variant is caught at the request-driver boundary and becomes the
/// `error` string of the `CodeGeneratorResponse`; no files are emitted once
/// one is raised.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// An unrecognised token in the plugin parameter string.
    #[error("unknown generator parameter: {0}")]
    UnknownParameter(String),

    /// A oneof's derived sum-type name collides with a sibling nested
    /// message or enum.
    #[error("oneof `{oneof}` in message `{message}` would generate type `{type_name}`, which conflicts with a nested type of the same name")]
    OneofNameCollision {
        message: String,
        oneof: String,
        type_name: String,
    },

    /// The `preamble` file option requires `single_file`.
    #[error("file `{0}` sets a preamble but not single_file; preamble lines can only be placed in single-file output")]
    PreambleRequiresSingleFile(String),

    /// Group-encoded fields are a proto1 leftover and are not generated.
    #[error("field `{0}` uses the unsupported GROUP wire type")]
    UnsupportedGroupField(String),

    /// A file in the request imports a file that precedes it nowhere in the
    /// request's file list.
    #[error("file `{file}` depends on `{dependency}`, which is missing from the request")]
    MissingDependency { file: String, dependency: String },

    /// The request's files form a dependency cycle.
    #[error("dependency cycle involving file `{0}`")]
    DependencyCycle(String),

    /// A file listed in `file_to_generate` is absent from `proto_file`.
    #[error("file `{0}` was requested for generation but carries no descriptor")]
    UnknownFile(String),
}
