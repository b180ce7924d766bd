use std::path::PathBuf;

use rstest::rstest;
use tempfile::TempDir;

use wikisync_core::config::{WikiConfig, WikiMode};
use wikisync_wiki::offline::{sanitize_filename, MANIFEST_FILE};
use wikisync_wiki::{connect, WriteResult};

fn offline_config(dir: PathBuf) -> WikiConfig {
    WikiConfig {
        mode: WikiMode::Offline { dir },
        extra_header: None,
    }
}

#[rstest]
#[case("Template:VPM/Foo/Latest_version", "Template_VPM_Foo_Latest_version.md")]
#[case("Template:VPM/Foo/1.0.0/Author_1", "Template_VPM_Foo_1.0.0_Author_1.md")]
#[case("What? <Really>", "What_ _Really.md")]
#[case("   ", "page.md")]
fn flattens_titles(#[case] title: &str, #[case] expected: &str) {
    assert_eq!(sanitize_filename(title), expected);
}

#[test]
fn connect_without_credentials_writes_files() {
    let dir = TempDir::new().unwrap();
    let wiki = connect(&offline_config(dir.path().to_path_buf())).expect("connect");

    let result = wiki
        .edit_page("Template:VPM/Foo/Latest version/License", "MIT", true)
        .unwrap();
    assert_eq!(
        result,
        WriteResult::Created {
            title: "Template:VPM/Foo/Latest version/License".into()
        }
    );

    let file = dir.path().join("Template_VPM_Foo_Latest version_License.md");
    assert_eq!(std::fs::read_to_string(file).unwrap(), "MIT");
    assert!(dir.path().join(MANIFEST_FILE).is_file());
}

#[test]
fn store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let wiki = connect(&offline_config(dir.path().to_path_buf())).unwrap();
        wiki.edit_page("Template:VPM/Foo/1.0.0", "1.0.0", true).unwrap();
    }
    let wiki = connect(&offline_config(dir.path().to_path_buf())).unwrap();
    assert_eq!(wiki.list_pages("Template:VPM/Foo/").unwrap(), vec!["Template:VPM/Foo/1.0.0"]);
    assert_eq!(wiki.get_content("Template:VPM/Foo/1.0.0").unwrap(), "1.0.0");
}
