use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "kiln.toml";

pub fn default_reload_port() -> u16 {
    32766
}

pub fn default_server_port() -> u16 {
    8080
}

pub fn default_debounce_ms() -> u64 {
    150
}

pub fn default_out_dir() -> PathBuf {
    PathBuf::from("static")
}

pub fn default_script_inputs() -> Vec<String> {
    vec!["app/**/*.{js,jsx,mjs,ts,tsx}".to_string()]
}

pub fn default_script_output() -> PathBuf {
    PathBuf::from("static/js")
}

pub fn default_script_entry() -> PathBuf {
    PathBuf::from("app/index.js")
}

pub fn default_script_file_name() -> String {
    "bundle.js".to_string()
}

pub fn default_style_inputs() -> Vec<String> {
    vec!["assets/sass/**/*.scss".to_string()]
}

pub fn default_style_output() -> PathBuf {
    PathBuf::from("static/css")
}

pub fn default_style_root() -> PathBuf {
    PathBuf::from("assets/sass")
}

pub fn default_browsers() -> Vec<String> {
    vec!["> 1%".to_string(), "IE 9".to_string()]
}

pub fn default_markup_inputs() -> Vec<String> {
    vec!["assets/**/*.html".to_string()]
}

pub fn default_markup_output() -> PathBuf {
    PathBuf::from("static")
}

pub fn default_markup_base() -> PathBuf {
    PathBuf::from("assets")
}

pub fn default_image_inputs() -> Vec<String> {
    vec!["assets/img/**/*.{png,svg,jpg,jpeg,gif,webp}".to_string()]
}

pub fn default_image_output() -> PathBuf {
    PathBuf::from("static/img")
}

pub fn default_image_base() -> PathBuf {
    PathBuf::from("assets/img")
}
