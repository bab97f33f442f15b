use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A vendored tree, its reference archive and an isolated config home
struct Fixture {
    temp: TempDir,
    local: PathBuf,
    archive: PathBuf,
}

impl Fixture {
    fn new(local_files: &[(&str, &str)], archive_files: &[(&str, &str)]) -> Self {
        let temp = TempDir::new().expect("temp dir");
        let local = temp.path().join("MetaplaySDK");
        fs::create_dir_all(&local).expect("create local dir");

        for (path, contents) in local_files {
            let full = local.join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).expect("create parent dirs");
            }
            fs::write(full, contents).expect("write local file");
        }

        let archive = temp.path().join("release.zip");
        create_zip_archive(&archive, archive_files);

        Fixture {
            temp,
            local,
            archive,
        }
    }

    fn out_dir(&self) -> PathBuf {
        let dir = self.temp.path().join("out");
        fs::create_dir_all(&dir).expect("create out dir");
        dir
    }

    fn run(&self, extra: &[&str]) -> Output {
        let mut args = vec![
            "check".to_string(),
            self.local.to_string_lossy().to_string(),
            self.archive.to_string_lossy().to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        run_cli(&args, self.temp.path())
    }

    fn run_json(&self, extra: &[&str]) -> Value {
        let mut args = vec!["--json"];
        args.extend_from_slice(extra);
        let output = self.run(&args);
        assert!(
            output.status.success(),
            "command failed: {}\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );

        let stdout = String::from_utf8(output.stdout).expect("stdout not utf-8");
        serde_json::from_str(&stdout).expect("invalid json output")
    }
}

fn run_cli<S: AsRef<std::ffi::OsStr>>(args: &[S], home: &Path) -> Output {
    let exe = env!("CARGO_BIN_EXE_vendiff");
    let config_dir = home.join("config");
    Command::new(exe)
        .args(args)
        .current_dir(home)
        .env("XDG_CONFIG_HOME", &config_dir)
        .env("APPDATA", &config_dir)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run vendiff")
}

fn create_zip_archive(path: &Path, files: &[(&str, &str)]) {
    let file = fs::File::create(path).expect("create zip");
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();

    zip.add_directory("MetaplaySDK/", options).expect("add root dir");
    for (name, contents) in files {
        zip.start_file(format!("MetaplaySDK/{}", name), options)
            .expect("start zip entry");
        zip.write_all(contents.as_bytes()).expect("write zip entry");
    }
    zip.finish().expect("finish zip");
}

fn modification_types(report: &Value) -> Vec<(String, String)> {
    let mut items: Vec<(String, String)> = report["modifications"]
        .as_array()
        .expect("modifications array")
        .iter()
        .map(|m| {
            (
                m["relative_path"].as_str().unwrap().to_string(),
                m["mod_type"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    items.sort();
    items
}

#[test]
fn test_check_unmodified_tree() {
    let files = [("Backend/Server.cs", "class Server {}\n"), ("README.md", "# SDK\n")];
    let fx = Fixture::new(&files, &files);
    let out_dir = fx.out_dir();

    let report = fx.run_json(&["--patch-dir", out_dir.to_str().unwrap()]);
    assert_eq!(report["summary"]["total"], 0);
    assert_eq!(report["patch_bytes"], 0);
    assert!(report["patch_file"].is_null());
    assert!(!out_dir.join("metaplay-sdk-modifications.patch").exists());
}

#[test]
fn test_check_reports_all_kinds_and_writes_patch() {
    let fx = Fixture::new(
        &[
            (".gitignore", "*.md\n"),
            ("config.txt", "port=8080\nhost=localhost\n"),
            ("added.txt", "brand new\n"),
            ("notes.md", "ignored\n"),
        ],
        &[
            (".gitignore", "*.md\n"),
            ("config.txt", "port=80\nhost=localhost\n"),
            ("removed.txt", "gone\n"),
        ],
    );
    let out_dir = fx.out_dir();

    let report = fx.run_json(&["--patch-dir", out_dir.to_str().unwrap()]);
    assert_eq!(report["summary"]["total"], 3);
    assert_eq!(report["summary"]["added"], 1);
    assert_eq!(report["summary"]["modified"], 1);
    assert_eq!(report["summary"]["deleted"], 1);
    assert_eq!(report["summary"]["binary"], 0);
    assert_eq!(
        modification_types(&report),
        vec![
            ("added.txt".to_string(), "added".to_string()),
            ("config.txt".to_string(), "modified".to_string()),
            ("removed.txt".to_string(), "deleted".to_string()),
        ]
    );

    let patch_path = out_dir.join("metaplay-sdk-modifications.patch");
    let patch = fs::read_to_string(&patch_path).expect("patch written");
    assert_eq!(report["patch_bytes"], patch.len());
    assert!(patch.contains("diff --git a/MetaplaySDK/config.txt b/MetaplaySDK/config.txt\n"));
    assert!(patch.contains("-port=80\n+port=8080\n"));
    assert!(patch.contains("new file mode 100644\n"));
    assert!(patch.contains("deleted file mode 100644\n"));
    assert!(!patch.contains("notes.md"));
}

#[test]
fn test_check_human_summary() {
    let fx = Fixture::new(
        &[("a.txt", "changed\n"), ("logo.png", "\0PNG")],
        &[("a.txt", "original\n")],
    );
    let patch_path = fx.out_dir().join("custom.patch");

    let output = fx.run(&["--patch-out", patch_path.to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Modifications to SDK: 2 file(s)"), "{stdout}");
    assert!(stdout.contains("  [modified] a.txt\n"), "{stdout}");
    assert!(stdout.contains("  [added] logo.png (binary)\n"), "{stdout}");
    assert!(stdout.contains("WARNING: 1 binary file(s)"), "{stdout}");
    assert!(
        stdout.contains(&format!("patch -p1 < {}", patch_path.display())),
        "{stdout}"
    );
    assert!(patch_path.exists());
}

#[test]
fn test_check_listing_is_capped() {
    let local: Vec<(String, String)> = (0..5)
        .map(|i| (format!("file{}.txt", i), format!("content {}\n", i)))
        .collect();
    let local_refs: Vec<(&str, &str)> = local
        .iter()
        .map(|(p, c)| (p.as_str(), c.as_str()))
        .collect();
    let fx = Fixture::new(&local_refs, &[]);

    let output = fx.run(&[
        "--max-listed",
        "2",
        "--patch-dir",
        fx.out_dir().to_str().unwrap(),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Modifications to SDK: 5 file(s)"), "{stdout}");
    assert!(stdout.contains("  ... and 3 more file(s)"), "{stdout}");
    assert_eq!(stdout.matches("  [added] ").count(), 2, "{stdout}");
}

#[test]
fn test_check_stdout_patch() {
    let fx = Fixture::new(&[("a.txt", "one\ntwo\n")], &[("a.txt", "one\n")]);
    let out_dir = fx.out_dir();

    let output = fx.run(&["--stdout-patch", "--patch-dir", out_dir.to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        "diff --git a/MetaplaySDK/a.txt b/MetaplaySDK/a.txt\n\
         --- a/MetaplaySDK/a.txt\n\
         +++ b/MetaplaySDK/a.txt\n\
         @@ -1,1 +1,2 @@\n \
         one\n\
         +two\n"
    );
    assert!(!out_dir.join("metaplay-sdk-modifications.patch").exists());
}

#[test]
fn test_check_ignore_flag() {
    let fx = Fixture::new(
        &[("Generated/Code.cs", "local\n"), ("Keep.cs", "same\n")],
        &[("Generated/Code.cs", "reference\n"), ("Keep.cs", "same\n")],
    );
    let out_dir = fx.out_dir();

    let report = fx.run_json(&["--ignore", "Generated/", "--patch-dir", out_dir.to_str().unwrap()]);
    assert_eq!(report["summary"]["total"], 0);
}

#[test]
fn test_check_config_file_overrides_defaults() {
    let fx = Fixture::new(&[("a.txt", "x\n")], &[("a.txt", "y\n")]);
    let config_dir = fx.temp.path().join("config").join("vendiff");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("vendiff.toml"),
        "patch_file_name = \"from-config.patch\"\n",
    )
    .unwrap();
    let out_dir = fx.out_dir();

    let report = fx.run_json(&["--patch-dir", out_dir.to_str().unwrap()]);
    assert_eq!(report["summary"]["modified"], 1);
    if cfg!(target_os = "linux") {
        assert!(out_dir.join("from-config.patch").exists());
    }
}

#[test]
fn test_check_invalid_archive_fails() {
    let fx = Fixture::new(&[("a.txt", "x\n")], &[]);
    fs::write(&fx.archive, b"this is not a zip").unwrap();

    let output = fx.run(&[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("could not check for local SDK modifications"),
        "{stderr}"
    );
}

#[test]
fn test_config_init_writes_default_file() {
    let temp = TempDir::new().unwrap();

    let output = run_cli(&["config", "--init"], temp.path());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Config file: "), "{stdout}");
    assert!(stdout.contains("archive_root_prefix = \"MetaplaySDK/\""), "{stdout}");
    if cfg!(target_os = "linux") {
        assert!(temp.path().join("config/vendiff/vendiff.toml").exists());
    }
}
