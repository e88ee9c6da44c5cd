use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write an access log into `dir` from (time, url, user_agent, remote_host)
/// tuples, one JSON record per line.
pub fn write_log(dir: &TempDir, name: &str, records: &[(&str, &str, &str, &str)]) -> PathBuf {
    let mut content = String::new();
    for (time, url, user_agent, remote_host) in records {
        content.push_str(&format!(
            r#"{{"time":"{}","url":"{}","user_agent":"{}","remote_host":"{}"}}"#,
            time, url, user_agent, remote_host
        ));
        content.push('\n');
    }
    write_raw(dir, name, &content)
}

#[allow(dead_code)]
pub fn write_raw(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write test log");
    path
}

/// An update-check request URL for the given reported version.
pub fn check_url(version: &str) -> String {
    format!("/upgrade/core.json?version={}", version)
}
