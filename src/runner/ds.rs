//! Runtime data model: values, objects, scopes and the operations on them.

pub mod array_object;
pub mod error;
pub mod function_object;
pub mod object;
pub mod scope;
pub mod value;

pub mod operations {
    pub mod object;
    pub mod test_and_comparison;
    pub mod type_conversion;
}
