use nkhdf5::NkError;

pub const SUCCESS: i32 = 0;
/// Bad arguments, configuration or missing inputs
pub const INPUT_ERROR: i32 = 1;
pub const EXECUTION_ERROR: i32 = 2;

pub fn for_error(err: &NkError) -> i32 {
    match err {
        NkError::Config(_) | NkError::FileNotFound(_) | NkError::Json(_) => INPUT_ERROR,
        _ => EXECUTION_ERROR,
    }
}

/// Prints the error and returns its exit code.
pub fn report(err: &NkError) -> i32 {
    eprintln!("Error: {}", err);
    for_error(err)
}
