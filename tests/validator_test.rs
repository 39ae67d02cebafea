use image_scout::images::validator::{
    ImageValidator, ValidatorPolicy, BASE_BLOCKLIST, EXTENDED_BLOCKLIST_EXTRAS, STRICT_EXTENSIONS,
};

const HOSTS: &[&str] = &[
    "https://p77cdn.tiktokcdn.com/obj/",
    "http://cdn.example.com/a/b/",
    "https://images.example.org/",
];

#[test]
fn blocklisted_keyword_rejects_whatever_the_extension() {
    let strict = ImageValidator::new(&ValidatorPolicy::strict()).unwrap();
    let loose = ImageValidator::new(&ValidatorPolicy::loose()).unwrap();

    for host in HOSTS {
        for kw in BASE_BLOCKLIST {
            for ext in [".jpg", ".PNG", ".webp", ".gif"] {
                let url = format!("{}{}-1{}", host, kw.to_uppercase(), ext);
                assert!(!strict.accepts(&url), "strict accepted {}", url);
                assert!(!loose.accepts(&url), "loose accepted {}", url);
            }
        }
        for kw in EXTENDED_BLOCKLIST_EXTRAS {
            let url = format!("{}cover{}.jpg", host, kw);
            assert!(!loose.accepts(&url), "loose accepted {}", url);
        }
    }
}

#[test]
fn clean_url_with_allowed_suffix_is_accepted_in_strict_mode() {
    let strict = ImageValidator::new(&ValidatorPolicy::strict()).unwrap();
    for host in HOSTS {
        for ext in STRICT_EXTENSIONS {
            for name in ["photo", "IMG_2041", "slide-3"] {
                let lower = format!("{}{}{}", host, name, ext);
                let upper = format!("{}{}{}", host, name, ext.to_uppercase());
                assert!(strict.accepts(&lower), "rejected {}", lower);
                assert!(strict.accepts(&upper), "rejected {}", upper);
            }
        }
    }
}

#[test]
fn output_keeps_original_casing() {
    let strict = ImageValidator::default();
    let url = "https://CDN.Example.com/Gallery/Shot.JPG";
    let kept: Vec<&str> = [url].into_iter().filter(|u| strict.accepts(u)).collect();
    assert_eq!(kept, vec![url]);
}
