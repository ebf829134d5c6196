use std::io::ErrorKind;
use std::path::PathBuf;
use std::{env, fs, io};

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Site {
    pub base_url: String,
}

#[derive(Deserialize, Debug)]
pub struct Paths {
    pub posts_dir: PathBuf,
    pub public_dir: PathBuf,
}

#[derive(Deserialize, Debug)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

#[derive(Deserialize, Debug)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// External write-only event sink. Deployments without this table run
/// with analytics ingestion disabled (the endpoint answers 503).
#[derive(Deserialize, Debug)]
pub struct Analytics {
    pub endpoint: String,
    pub auth_token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub site: Site,
    pub paths: Paths,
    pub server: Server,
    pub log: Option<Log>,
    pub analytics: Option<Analytics>,
}

fn parse_path(path: PathBuf) -> PathBuf {
    if path.starts_with("${exe_dir}") {
        let cur_exe = env::current_exe().unwrap();
        let exe_dir = cur_exe.parent().unwrap().to_str().unwrap();
        let str_path = path.to_str().unwrap();
        PathBuf::from(str_path.replace("${exe_dir}", exe_dir))
    } else {
        path
    }
}

pub fn read_config(cfg_path: &PathBuf) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.to_str().unwrap(), e))),
    };

    let mut cfg: Config = match toml::from_str::<Config>(cfg_content.as_str()) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths = Paths {
        posts_dir: parse_path(cfg.paths.posts_dir),
        public_dir: parse_path(cfg.paths.public_dir),
    };

    Ok(cfg)
}
