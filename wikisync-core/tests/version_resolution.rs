use rstest::rstest;
use wikisync_core::{group_by_name, version, Package};

fn release(name: &str, version: &str) -> Package {
    Package {
        name: name.to_string(),
        version: version.to_string(),
        ..Default::default()
    }
}

#[rstest]
#[case(&["1.0.0", "1.1.0", "2.0.0-beta.1"], Some("2.0.0-beta.1"), Some("1.1.0"), Some("2.0.0-beta.1"))]
#[case(&["1.0.0", "1.0.0-rc.1"], Some("1.0.0"), Some("1.0.0"), Some("1.0.0-rc.1"))]
#[case(&["0.1.0"], Some("0.1.0"), Some("0.1.0"), None)]
#[case(&["garbage", "1.0"], Some("1.0"), Some("1.0"), None)]
#[case(&["garbage"], None, None, None)]
fn trio_selection(
    #[case] input: &[&str],
    #[case] latest: Option<&str>,
    #[case] stable: Option<&str>,
    #[case] unstable: Option<&str>,
) {
    let set: Vec<Package> = input.iter().map(|v| release("pkg", v)).collect();
    let trio = version::resolve(&set);
    assert_eq!(trio.latest.as_ref().map(|p| p.version.as_str()), latest);
    assert_eq!(trio.stable.as_ref().map(|p| p.version.as_str()), stable);
    assert_eq!(trio.unstable.as_ref().map(|p| p.version.as_str()), unstable);
}

#[test]
fn resolve_all_keeps_full_package_records() {
    let mut newest = release("com.example.a", "2.0.0");
    newest.display_name = "Example A".into();
    let sets = group_by_name(vec![
        release("com.example.a", "1.0.0"),
        newest,
        release("com.example.b", "0.0.1-preview"),
    ]);

    let trios = version::resolve_all(&sets);
    assert_eq!(trios.len(), 2);
    let a = &trios["com.example.a"];
    assert_eq!(a.latest.as_ref().unwrap().display_name, "Example A");
    let b = &trios["com.example.b"];
    assert!(b.stable.is_none());
    assert_eq!(b.unstable.as_ref().unwrap().version, "0.0.1-preview");
}
