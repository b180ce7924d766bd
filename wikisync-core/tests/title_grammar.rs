use wikisync_core::title::{self, LatestKind, PageKind};

#[test]
fn latest_stable_subpage_title() {
    let parsed = title::parse_title("Template:VPM/Foo/Latest_stable_version/Description").expect("managed");
    assert_eq!(parsed.package, "Foo");
    assert_eq!(parsed.kind, PageKind::LatestStableVersionSubpage);
    assert_eq!(parsed.kind.as_str(), "latest_stable_version_subpage");
    assert_eq!(parsed.tag, "Description");
}

#[test]
fn specific_version_title() {
    let parsed = title::parse_title("Template:VPM/Foo/2.1.0").expect("managed");
    assert_eq!(parsed.package, "Foo");
    assert_eq!(parsed.kind, PageKind::Version);
    assert_eq!(parsed.tag, "2.1.0");
    assert!(parsed.subpage.is_none());
}

#[test]
fn free_form_version_tag_is_still_a_version_page() {
    let parsed = title::parse_title("Template:VPM/Foo/Legacy build").expect("managed");
    assert_eq!(parsed.kind, PageKind::Version);
    assert_eq!(parsed.tag, "Legacy build");
}

#[test]
fn titles_outside_the_prefix_are_ignored() {
    assert!(title::parse_title("Template:Other/Foo/1.0.0").is_none());
    assert!(title::parse_title("VPM/Foo/1.0.0").is_none());
    assert!(title::parse_title("Main Page").is_none());
}

#[test]
fn package_root_without_segment_is_ignored() {
    assert!(title::parse_title("Template:VPM/Foo").is_none());
    assert!(title::parse_title("Template:VPM/").is_none());
}

#[test]
fn latest_main_titles() {
    assert_eq!(
        title::main_title("Foo", LatestKind::Latest.segment()),
        "Template:VPM/Foo/Latest_version"
    );
    for kind in LatestKind::all() {
        let t = title::main_title("Foo", kind.segment());
        let parsed = title::parse_title(&t).expect("managed");
        assert!(!parsed.kind.is_subpage());
        assert!(parsed.tag.is_empty());
    }
}
