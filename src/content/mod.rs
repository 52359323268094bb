//! Content sync: the page text as a JSON document (`content.json`), scraped
//! from and applied to an [`EditableSurface`].

pub mod admin;
pub mod publish;
pub mod surface;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use admin::AdminMode;
pub use publish::{PublishError, PublishOutcome, Publisher};
pub use surface::{EditableSurface, ListKind, Region, RegionMap, Section, UnknownRegion};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content document is not valid JSON: {0}")]
    Parse(String),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("admin mode is not enabled")]
    NotAdmin,
    #[error("nothing saved yet; save the page first")]
    NothingSaved,
    #[error("token is empty")]
    EmptyToken,
    #[error("could not store token: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for ContentError {
    fn from(e: serde_json::Error) -> Self {
        ContentError::Parse(e.to_string())
    }
}

/// Top-level sections are optional on import; a missing section leaves the
/// page untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<Hero>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<About>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Projects>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Skills>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<Footer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hero {
    /// May contain inline HTML.
    pub title: String,
    /// May contain inline HTML (links).
    pub description: String,
    pub primary_button: String,
    pub secondary_button: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct About {
    pub title: String,
    pub subtitle: String,
    pub heading: String,
    pub description: String,
    pub stats: Vec<Stat>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stat {
    pub number: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projects {
    pub title: String,
    pub subtitle: String,
    pub items: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub icon: String,
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub demo_link: String,
    pub code_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub title: String,
    pub subtitle: String,
    pub categories: Vec<SkillCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillCategory {
    pub title: String,
    pub items: Vec<Skill>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub icon: String,
    pub name: String,
    /// Percentage shown by the progress bar; `null` when the page has none.
    pub level: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub title: String,
    pub subtitle: String,
    pub info: ContactInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Footer {
    /// May contain inline HTML.
    pub copyright: String,
}

impl ContentDocument {
    /// Parse a complete document. Nothing is applied anywhere on failure.
    pub fn from_json(raw: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Two-space pretty JSON, as written to `content.json`.
    pub fn to_pretty_json(&self) -> Result<String, ContentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn text_of<S: EditableSurface + ?Sized>(surface: &S, region: Region) -> String {
    surface.text(region).unwrap_or_default()
}

/// Scrape every known region into a full document.
pub fn collect<S: EditableSurface + ?Sized>(surface: &S) -> ContentDocument {
    let t = |r| text_of(surface, r);

    let hero = Hero {
        title: t(Region::HeroTitle),
        description: t(Region::HeroDescription),
        primary_button: t(Region::HeroPrimaryButton),
        secondary_button: t(Region::HeroSecondaryButton),
    };

    let about = About {
        title: t(Region::SectionTitle(Section::About)),
        subtitle: t(Region::SectionSubtitle(Section::About)),
        heading: t(Region::AboutHeading),
        description: t(Region::AboutDescription),
        stats: (0..surface.count(ListKind::Stats))
            .map(|i| Stat {
                number: t(Region::StatNumber(i)),
                label: t(Region::StatLabel(i)),
            })
            .collect(),
    };

    let projects = Projects {
        title: t(Region::SectionTitle(Section::Projects)),
        subtitle: t(Region::SectionSubtitle(Section::Projects)),
        items: (0..surface.count(ListKind::Projects))
            .map(|i| Project {
                icon: t(Region::ProjectIcon(i)),
                title: t(Region::ProjectTitle(i)),
                description: t(Region::ProjectDescription(i)),
                tech_stack: (0..surface.count(ListKind::ProjectTech(i)))
                    .map(|j| t(Region::ProjectTech(i, j)))
                    .collect(),
                demo_link: t(Region::ProjectDemoLink(i)),
                code_link: t(Region::ProjectCodeLink(i)),
            })
            .collect(),
    };

    let skills = Skills {
        title: t(Region::SectionTitle(Section::Skills)),
        subtitle: t(Region::SectionSubtitle(Section::Skills)),
        categories: (0..surface.count(ListKind::SkillCategories))
            .map(|c| SkillCategory {
                title: t(Region::SkillCategoryTitle(c)),
                items: (0..surface.count(ListKind::Skills(c)))
                    .map(|i| Skill {
                        icon: t(Region::SkillIcon(c, i)),
                        name: t(Region::SkillName(c, i)),
                        level: surface
                            .text(Region::SkillLevel(c, i))
                            .and_then(|s| leading_level(&s)),
                    })
                    .collect(),
            })
            .collect(),
    };

    let contact = Contact {
        title: t(Region::SectionTitle(Section::Contact)),
        subtitle: t(Region::SectionSubtitle(Section::Contact)),
        info: ContactInfo {
            email: t(Region::ContactEmail),
            phone: t(Region::ContactPhone),
            location: t(Region::ContactLocation),
        },
    };

    ContentDocument {
        hero: Some(hero),
        about: Some(about),
        projects: Some(projects),
        skills: Some(skills),
        contact: Some(contact),
        footer: Some(Footer {
            copyright: t(Region::FooterCopyright),
        }),
    }
}

/// Write a document onto the surface. Only regions that exist on the page
/// are touched; extra list entries in the document are ignored. Returns the
/// number of regions written.
pub fn apply<S: EditableSurface + ?Sized>(doc: &ContentDocument, surface: &mut S) -> usize {
    let mut written = 0usize;
    let mut put = |s: &mut S, r: Region, v: &str| {
        if s.set_text(r, v) {
            written += 1;
        }
    };

    if let Some(h) = &doc.hero {
        put(surface, Region::HeroTitle, &h.title);
        put(surface, Region::HeroDescription, &h.description);
        put(surface, Region::HeroPrimaryButton, &h.primary_button);
        put(surface, Region::HeroSecondaryButton, &h.secondary_button);
    }

    if let Some(a) = &doc.about {
        put(surface, Region::SectionTitle(Section::About), &a.title);
        put(surface, Region::SectionSubtitle(Section::About), &a.subtitle);
        put(surface, Region::AboutHeading, &a.heading);
        put(surface, Region::AboutDescription, &a.description);
        let n = surface.count(ListKind::Stats);
        for (i, stat) in a.stats.iter().enumerate().take(n) {
            put(surface, Region::StatNumber(i), &stat.number);
            put(surface, Region::StatLabel(i), &stat.label);
        }
    }

    if let Some(p) = &doc.projects {
        put(surface, Region::SectionTitle(Section::Projects), &p.title);
        put(surface, Region::SectionSubtitle(Section::Projects), &p.subtitle);
        let n = surface.count(ListKind::Projects);
        for (i, item) in p.items.iter().enumerate().take(n) {
            put(surface, Region::ProjectIcon(i), &item.icon);
            put(surface, Region::ProjectTitle(i), &item.title);
            put(surface, Region::ProjectDescription(i), &item.description);
            let tags = surface.count(ListKind::ProjectTech(i));
            for (j, tech) in item.tech_stack.iter().enumerate().take(tags) {
                put(surface, Region::ProjectTech(i, j), tech);
            }
            put(surface, Region::ProjectDemoLink(i), &item.demo_link);
            put(surface, Region::ProjectCodeLink(i), &item.code_link);
        }
    }

    if let Some(s) = &doc.skills {
        put(surface, Region::SectionTitle(Section::Skills), &s.title);
        put(surface, Region::SectionSubtitle(Section::Skills), &s.subtitle);
        let n = surface.count(ListKind::SkillCategories);
        for (c, cat) in s.categories.iter().enumerate().take(n) {
            put(surface, Region::SkillCategoryTitle(c), &cat.title);
            let items = surface.count(ListKind::Skills(c));
            for (i, skill) in cat.items.iter().enumerate().take(items) {
                put(surface, Region::SkillIcon(c, i), &skill.icon);
                put(surface, Region::SkillName(c, i), &skill.name);
                if let Some(level) = skill.level {
                    put(surface, Region::SkillLevel(c, i), &level.to_string());
                }
            }
        }
    }

    if let Some(c) = &doc.contact {
        put(surface, Region::SectionTitle(Section::Contact), &c.title);
        put(surface, Region::SectionSubtitle(Section::Contact), &c.subtitle);
        put(surface, Region::ContactEmail, &c.info.email);
        put(surface, Region::ContactPhone, &c.info.phone);
        put(surface, Region::ContactLocation, &c.info.location);
    }

    if let Some(f) = &doc.footer {
        put(surface, Region::FooterCopyright, &f.copyright);
    }

    written
}

/// Integer prefix of a level attribute: "90%" and " 90" both read as 90.
fn leading_level(raw: &str) -> Option<u32> {
    let t = raw.trim_start();
    let t = t.strip_prefix('+').unwrap_or(t);
    let end = t.find(|c: char| !c.is_ascii_digit()).unwrap_or(t.len());
    t[..end].parse().ok()
}

/// A page shaped exactly like `doc`: every region the document mentions is
/// declared and filled. Sections the document lacks get empty scalar regions.
pub fn layout(doc: &ContentDocument) -> RegionMap {
    let mut m = RegionMap::new();

    let hero = doc.hero.clone().unwrap_or_default();
    m.insert(Region::HeroTitle, hero.title)
        .insert(Region::HeroDescription, hero.description)
        .insert(Region::HeroPrimaryButton, hero.primary_button)
        .insert(Region::HeroSecondaryButton, hero.secondary_button);

    let about = doc.about.clone().unwrap_or_default();
    m.insert(Region::SectionTitle(Section::About), about.title)
        .insert(Region::SectionSubtitle(Section::About), about.subtitle)
        .insert(Region::AboutHeading, about.heading)
        .insert(Region::AboutDescription, about.description);
    for (i, s) in about.stats.into_iter().enumerate() {
        m.insert(Region::StatNumber(i), s.number)
            .insert(Region::StatLabel(i), s.label);
    }

    let projects = doc.projects.clone().unwrap_or_default();
    m.insert(Region::SectionTitle(Section::Projects), projects.title)
        .insert(Region::SectionSubtitle(Section::Projects), projects.subtitle);
    for (i, p) in projects.items.into_iter().enumerate() {
        m.insert(Region::ProjectIcon(i), p.icon)
            .insert(Region::ProjectTitle(i), p.title)
            .insert(Region::ProjectDescription(i), p.description)
            .insert(Region::ProjectDemoLink(i), p.demo_link)
            .insert(Region::ProjectCodeLink(i), p.code_link);
        for (j, tech) in p.tech_stack.into_iter().enumerate() {
            m.insert(Region::ProjectTech(i, j), tech);
        }
    }

    let skills = doc.skills.clone().unwrap_or_default();
    m.insert(Region::SectionTitle(Section::Skills), skills.title)
        .insert(Region::SectionSubtitle(Section::Skills), skills.subtitle);
    for (c, cat) in skills.categories.into_iter().enumerate() {
        m.insert(Region::SkillCategoryTitle(c), cat.title);
        for (i, s) in cat.items.into_iter().enumerate() {
            m.insert(Region::SkillIcon(c, i), s.icon)
                .insert(Region::SkillName(c, i), s.name);
            if let Some(level) = s.level {
                m.insert(Region::SkillLevel(c, i), level.to_string());
            }
        }
    }

    let contact = doc.contact.clone().unwrap_or_default();
    m.insert(Region::SectionTitle(Section::Contact), contact.title)
        .insert(Region::SectionSubtitle(Section::Contact), contact.subtitle)
        .insert(Region::ContactEmail, contact.info.email)
        .insert(Region::ContactPhone, contact.info.phone)
        .insert(Region::ContactLocation, contact.info.location);

    let footer = doc.footer.clone().unwrap_or_default();
    m.insert(Region::FooterCopyright, footer.copyright);
    m
}
