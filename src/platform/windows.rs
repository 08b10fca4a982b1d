use std::env;
use std::path::PathBuf;

/// `%APPDATA%/Xiavion`
pub fn get_config_dir() -> PathBuf {
    let appdata = env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Temp"));
    PathBuf::from(appdata).join("Xiavion")
}

/// `%LOCALAPPDATA%/Xiavion`
pub fn get_data_dir() -> PathBuf {
    let local = env::var("LOCALAPPDATA").unwrap_or_else(|_| String::from("C:\\Temp\\Local"));
    PathBuf::from(local).join("Xiavion")
}
