//! Path constants into `SourceCodeInfo` locations, mirroring the field
//! numbers of the descriptor protos.

pub struct FileDescriptorProtoLocations;

impl FileDescriptorProtoLocations {
    pub const MESSAGE_TYPE: i32 = 4;
    pub const ENUM_TYPE: i32 = 5;
    pub const SERVICE: i32 = 6;
    pub const EXTENSION: i32 = 7;
}

pub struct DescriptorProtoLocations;

impl DescriptorProtoLocations {
    pub const FIELD: i32 = 2;
    pub const NESTED_TYPE: i32 = 3;
    pub const ENUM_TYPE: i32 = 4;
    pub const EXTENSION: i32 = 6;
    pub const ONEOF_DECL: i32 = 8;
}

pub struct EnumDescriptorProtoLocations;

impl EnumDescriptorProtoLocations {
    pub const VALUE: i32 = 2;
}
