use std::collections::BTreeSet;

use rstest::rstest;

use wikisync_core::{group_by_name, Package};
use wikisync_renderer::{render_summary, KnownVersionTags};

fn pkg(name: &str, version: &str, display: &str) -> Package {
    Package {
        name: name.into(),
        version: version.into(),
        display_name: display.into(),
        ..Default::default()
    }
}

fn known(name: &str, tags: &[&str]) -> KnownVersionTags {
    let mut map = KnownVersionTags::new();
    map.insert(
        name.to_string(),
        tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
    );
    map
}

#[test]
fn renders_full_row() {
    let sets = group_by_name(vec![
        pkg("com.example.tool", "1.0.0", "Tool"),
        pkg("com.example.tool", "1.1.0-beta.1", "Tool"),
    ]);
    let out = render_summary(&known("com.example.tool", &["1.0.0"]), &sets).unwrap();

    let expected = "\
{| class=\"wikitable sortable\"
|-
! Name
! Display Name
! Latest Version(s)
|-
| com.example.tool
| Tool
| style=\"white-space: nowrap;\" | 

* [[Template:VPM/com.example.tool/Latest version|Latest version]] ([[Template:VPM/com.example.tool/1.1.0-beta.1|1.1.0-beta.1]])

* [[Template:VPM/com.example.tool/Latest stable version|Latest stable version]] ([[Template:VPM/com.example.tool/1.0.0|1.0.0]])

* [[Template:VPM/com.example.tool/Latest unstable version|Latest unstable version]] ([[Template:VPM/com.example.tool/1.1.0-beta.1|1.1.0-beta.1]])

* [[Template:VPM/com.example.tool/1.0.0|1.0.0]]
|}
";
    assert_eq!(out, expected);
}

#[rstest]
#[case("a|b", "a{{!}}b")]
#[case("x=y", "x{{=}}y")]
fn interpolated_text_is_escaped(#[case] display: &str, #[case] escaped: &str) {
    let sets = group_by_name(vec![pkg("p", "1.0.0", display)]);
    let out = render_summary(&KnownVersionTags::new(), &sets).unwrap();
    assert!(out.contains(&format!("| {escaped}\n")), "{out}");
    assert!(!out.contains(display));
}

#[test]
fn output_is_deterministic() {
    let sets = group_by_name(vec![
        pkg("b", "1.0.0", ""),
        pkg("A", "2.0.0", ""),
        pkg("c", "0.1.0-rc.1", ""),
    ]);
    let tags = known("b", &["1.0.0"]);
    let first = render_summary(&tags, &sets).unwrap();
    let second = render_summary(&tags, &sets).unwrap();
    assert_eq!(first, second);

    let a = first.find("| A\n").unwrap();
    let b = first.find("| b\n").unwrap();
    let c = first.find("| c\n").unwrap();
    assert!(a < b && b < c);
}
