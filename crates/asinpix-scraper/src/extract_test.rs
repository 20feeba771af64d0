use super::*;

const IMG: &str = "https://m.media-amazon.com/images/I/";

fn entry(hi_res: Option<&str>, large: &str) -> String {
    let hi = match hi_res {
        Some(name) => format!("\"{IMG}{name}\""),
        None => "null".to_owned(),
    };
    format!(
        r#"{{"hiRes":{hi},"thumb":"{IMG}thumb.jpg","large":"{IMG}{large}","main":{{"{IMG}{large}":[500,500]}},"variant":"MAIN"}}"#
    )
}

fn page(entries: &[String]) -> String {
    format!(
        r#"<html><head><script type="text/javascript">var other = 1;</script></head>
<body>
<script type="text/javascript">
P.when('A').register("ImageBlockATF", function(A){{
  var data = {{
    'colorImages': {{ 'initial': [{}]}},
    'colorToAsin': {{'initial': {{}}}}
  }};
  return data;
}});
</script>
</body></html>"#,
        entries.join(",")
    )
}

#[test]
fn returns_hi_res_urls_in_document_order() {
    let html = page(&[
        entry(Some("one._SL1500_.jpg"), "one.jpg"),
        entry(Some("two._SL1500_.jpg"), "two.jpg"),
        entry(Some("three._SL1500_.jpg"), "three.jpg"),
    ]);
    let urls = ColorImagesExtractor::new().extract(&html);
    assert_eq!(
        urls,
        vec![
            format!("{IMG}one._SL1500_.jpg"),
            format!("{IMG}two._SL1500_.jpg"),
            format!("{IMG}three._SL1500_.jpg"),
        ]
    );
}

#[test]
fn null_hi_res_falls_back_to_large() {
    let html = page(&[
        entry(None, "only-large.jpg"),
        entry(Some("hi.jpg"), "lg.jpg"),
    ]);
    let urls = ColorImagesExtractor::new().extract(&html);
    assert_eq!(
        urls,
        vec![format!("{IMG}only-large.jpg"), format!("{IMG}hi.jpg")]
    );
}

#[test]
fn no_marker_is_empty_not_error() {
    let html = "<html><script>var gallery = [];</script><p>nothing here</p></html>";
    assert!(ColorImagesExtractor::new().extract(html).is_empty());
    assert!(JsonGalleryExtractor.extract(html).is_empty());
}

#[test]
fn marker_outside_script_is_ignored() {
    let html = format!(
        "<html><p>colorImages {}</p></html>",
        entry(Some("hi.jpg"), "lg.jpg")
    );
    assert!(ColorImagesExtractor::new().extract(&html).is_empty());
}

#[test]
fn only_first_marker_script_is_used() {
    let first = page(&[entry(Some("first.jpg"), "first-lg.jpg")]);
    let second = page(&[entry(Some("second.jpg"), "second-lg.jpg")]);
    let html = format!("{first}{second}");
    let urls = ColorImagesExtractor::new().extract(&html);
    assert_eq!(urls, vec![format!("{IMG}first.jpg")]);
}

#[test]
fn entries_from_other_hosts_do_not_match() {
    let html = page(&[String::from(
        r#"{"hiRes":"https://evil.example/a.jpg","thumb":"https://evil.example/t.jpg","large":"https://evil.example/l.jpg"}"#,
    )]);
    assert!(ColorImagesExtractor::new().extract(&html).is_empty());
}

#[test]
fn entries_without_a_large_url_are_skipped() {
    let html = page(&[
        format!(r#"{{"hiRes":null,"thumb":"{IMG}t.jpg","large":""}}"#),
        format!(r#"{{"hiRes":null,"thumb":"{IMG}t.jpg","large":"{IMG}l.jpg"}}"#),
    ]);
    let urls = ColorImagesExtractor::new().extract(&html);
    assert_eq!(urls, vec![format!("{IMG}l.jpg")]);
}

#[test]
fn candidates_expose_both_fields() {
    let html = page(&[entry(None, "lg.jpg")]);
    let candidates = ColorImagesExtractor::new().candidates(&html);
    assert_eq!(
        candidates,
        vec![ImageCandidate {
            hi_res: None,
            large: format!("{IMG}lg.jpg"),
        }]
    );
}

#[test]
fn custom_prefix_matches_other_hosts() {
    let prefix = "http://127.0.0.1:9999/img/";
    let html = page(&[format!(
        r#"{{"hiRes":null,"thumb":"{prefix}t.jpg","large":"{prefix}l.jpg"}}"#
    )]);
    let urls = ColorImagesExtractor::with_image_prefix(prefix).extract(&html);
    assert_eq!(urls, vec![format!("{prefix}l.jpg")]);
}

#[test]
fn chosen_url_rule() {
    let both = ImageCandidate {
        hi_res: Some("hi".to_owned()),
        large: "lg".to_owned(),
    };
    assert_eq!(both.chosen_url(), Some("hi"));

    let blank_hi = ImageCandidate {
        hi_res: Some(String::new()),
        large: "lg".to_owned(),
    };
    assert_eq!(blank_hi.chosen_url(), Some("lg"));

    let nothing = ImageCandidate {
        hi_res: None,
        large: String::new(),
    };
    assert_eq!(nothing.chosen_url(), None);
}

#[test]
fn json_extractor_agrees_with_pattern_extractor() {
    let html = page(&[
        entry(Some("a-hi.jpg"), "a.jpg"),
        entry(None, "b.jpg"),
        entry(Some("c-hi.jpg"), "c.jpg"),
    ]);
    assert_eq!(
        JsonGalleryExtractor.extract(&html),
        ColorImagesExtractor::new().extract(&html)
    );
}

#[test]
fn json_extractor_tolerates_malformed_payload() {
    let html = "<script>var x = {'colorImages': {'initial': [{\"hiRes\": oops}]}};</script>";
    assert!(JsonGalleryExtractor.extract(html).is_empty());
}
