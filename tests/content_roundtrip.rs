// tests/content_roundtrip.rs
// Page ⇄ content.json: collect, export, import, apply.

use portfolio_board::content::{
    self, About, ContentDocument, ContentError, Contact, ContactInfo, EditableSurface, Footer,
    Hero, Project, Projects, Region, Skill, SkillCategory, Skills, Stat,
};
use portfolio_board::{AdminMode, LocalStore, SiteConfig, SiteContext};

fn sample() -> ContentDocument {
    ContentDocument {
        hero: Some(Hero {
            title: "Hi, I'm <span class=\"highlight\">Dev</span>".into(),
            description: "Builds things. <a href=\"https://blog.example\">blog</a>".into(),
            primary_button: "See projects".into(),
            secondary_button: "Contact".into(),
        }),
        about: Some(About {
            title: "About".into(),
            subtitle: "who I am".into(),
            heading: "Hello".into(),
            description: "Ten years of \"shipping\" & fixing.".into(),
            stats: vec![
                Stat {
                    number: "10+".into(),
                    label: "Years".into(),
                },
                Stat {
                    number: "50".into(),
                    label: "Projects".into(),
                },
            ],
        }),
        projects: Some(Projects {
            title: "Projects".into(),
            subtitle: "recent work".into(),
            items: vec![Project {
                icon: "fa-robot".into(),
                title: "Bot".into(),
                description: "A chat bot".into(),
                tech_stack: vec!["Rust".into(), "Tokio".into()],
                demo_link: "https://demo.example".into(),
                code_link: "#".into(),
            }],
        }),
        skills: Some(Skills {
            title: "Skills".into(),
            subtitle: "tools".into(),
            categories: vec![SkillCategory {
                title: "Backend".into(),
                items: vec![
                    Skill {
                        icon: "fab fa-rust".into(),
                        name: "Rust".into(),
                        level: Some(90),
                    },
                    Skill {
                        icon: "fas fa-database".into(),
                        name: "SQL".into(),
                        level: None,
                    },
                ],
            }],
        }),
        contact: Some(Contact {
            title: "Contact".into(),
            subtitle: "say hi".into(),
            info: ContactInfo {
                email: "me@example.com".into(),
                phone: "010-0000-0000".into(),
                location: "Seoul, 대한민국".into(),
            },
        }),
        footer: Some(Footer {
            copyright: "&copy; 2024 Dev. All rights reserved.".into(),
        }),
    }
}

#[test]
fn collect_then_apply_onto_fresh_page_reproduces_every_field() {
    let original = sample();
    let page = content::layout(&original);
    let collected = content::collect(&page);
    assert_eq!(collected, original);

    // Fresh copy of the page with different text, same shape.
    let mut fresh = content::layout(&original);
    for (region, _) in page.iter() {
        fresh.set_text(*region, "placeholder");
    }
    content::apply(&collected, &mut fresh);
    assert_eq!(fresh, page);
}

#[test]
fn export_then_import_restores_page() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = SiteContext::with_store(SiteConfig::default(), LocalStore::in_memory());

    let mut a = AdminMode::new(ctx.clone(), content::layout(&sample()));
    assert!(a.enable("admin12"));
    a.save().unwrap();
    let file = a.export(dir.path()).unwrap();
    assert_eq!(file.file_name().unwrap(), "content.json");
    let raw = std::fs::read_to_string(&file).unwrap();
    assert!(raw.starts_with("{\n  \"hero\""));
    assert!(raw.contains("\"primaryButton\""));

    let blank = content::layout(&ContentDocument {
        about: sample().about,
        projects: sample().projects,
        skills: sample().skills,
        ..Default::default()
    });
    let mut b = AdminMode::new(ctx, blank);
    b.import(&file).unwrap();
    assert_eq!(content::collect(b.surface()), sample());
}

#[test]
fn export_requires_a_save() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = SiteContext::with_store(SiteConfig::default(), LocalStore::in_memory());
    let a = AdminMode::new(ctx, content::layout(&sample()));
    assert!(matches!(a.export(dir.path()), Err(ContentError::NothingSaved)));
}

#[test]
fn broken_file_applies_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("content.json");
    std::fs::write(&bad, r#"{"hero": {"title": "half"#).unwrap();

    let ctx = SiteContext::with_store(SiteConfig::default(), LocalStore::in_memory());
    let page = content::layout(&sample());
    let mut a = AdminMode::new(ctx, page.clone());
    assert!(matches!(a.import(&bad), Err(ContentError::Parse(_))));
    assert_eq!(*a.surface(), page);

    let missing = dir.path().join("nope.json");
    assert!(matches!(a.import(&missing), Err(ContentError::Io { .. })));
}

#[test]
fn editing_and_saving_captures_new_text() {
    let ctx = SiteContext::with_store(SiteConfig::default(), LocalStore::in_memory());
    let mut a = AdminMode::new(ctx, content::layout(&sample()));
    assert!(a.enable("admin12"));
    a.surface_mut().set_text(Region::ProjectTech(0, 1), "Axum");
    let saved = a.save().unwrap().clone();
    let tech = &saved.projects.unwrap().items[0].tech_stack;
    assert_eq!(tech, &vec!["Rust".to_string(), "Axum".to_string()]);
}
