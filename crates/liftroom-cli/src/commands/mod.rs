pub mod config;
pub mod history;
pub mod plan;
pub mod session;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
