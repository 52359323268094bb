//! Named editable regions of the page and the surface trait the admin flow
//! reads from and writes to.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Page sections that carry a title/subtitle pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    About,
    Projects,
    Skills,
    Contact,
}

/// One addressable text slot on the page. Indices are zero-based positions in
/// document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    HeroTitle,
    HeroDescription,
    HeroPrimaryButton,
    HeroSecondaryButton,
    SectionTitle(Section),
    SectionSubtitle(Section),
    AboutHeading,
    AboutDescription,
    StatNumber(usize),
    StatLabel(usize),
    ProjectIcon(usize),
    ProjectTitle(usize),
    ProjectDescription(usize),
    ProjectTech(usize, usize),
    ProjectDemoLink(usize),
    ProjectCodeLink(usize),
    SkillCategoryTitle(usize),
    SkillIcon(usize, usize),
    SkillName(usize, usize),
    SkillLevel(usize, usize),
    ContactEmail,
    ContactPhone,
    ContactLocation,
    FooterCopyright,
}

impl Region {
    /// Whether admin mode lets the user type into this region. Icons, links
    /// and skill levels are carried through save/apply but not text-edited.
    pub fn is_text_editable(&self) -> bool {
        !matches!(
            self,
            Region::ProjectIcon(_)
                | Region::ProjectDemoLink(_)
                | Region::ProjectCodeLink(_)
                | Region::SkillIcon(..)
                | Region::SkillLevel(..)
        )
    }
}

impl Section {
    fn key(self) -> &'static str {
        match self {
            Section::About => "about",
            Section::Projects => "projects",
            Section::Skills => "skills",
            Section::Contact => "contact",
        }
    }

    fn from_key(s: &str) -> Option<Self> {
        match s {
            "about" => Some(Section::About),
            "projects" => Some(Section::Projects),
            "skills" => Some(Section::Skills),
            "contact" => Some(Section::Contact),
            _ => None,
        }
    }
}

/// Dotted key, mirroring the JSON path (`hero.title`, `projects.0.tech.1`).
impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Region::HeroTitle => f.write_str("hero.title"),
            Region::HeroDescription => f.write_str("hero.description"),
            Region::HeroPrimaryButton => f.write_str("hero.primaryButton"),
            Region::HeroSecondaryButton => f.write_str("hero.secondaryButton"),
            Region::SectionTitle(s) => write!(f, "{}.title", s.key()),
            Region::SectionSubtitle(s) => write!(f, "{}.subtitle", s.key()),
            Region::AboutHeading => f.write_str("about.heading"),
            Region::AboutDescription => f.write_str("about.description"),
            Region::StatNumber(i) => write!(f, "about.stats.{i}.number"),
            Region::StatLabel(i) => write!(f, "about.stats.{i}.label"),
            Region::ProjectIcon(i) => write!(f, "projects.{i}.icon"),
            Region::ProjectTitle(i) => write!(f, "projects.{i}.title"),
            Region::ProjectDescription(i) => write!(f, "projects.{i}.description"),
            Region::ProjectTech(i, j) => write!(f, "projects.{i}.tech.{j}"),
            Region::ProjectDemoLink(i) => write!(f, "projects.{i}.demoLink"),
            Region::ProjectCodeLink(i) => write!(f, "projects.{i}.codeLink"),
            Region::SkillCategoryTitle(c) => write!(f, "skills.{c}.title"),
            Region::SkillIcon(c, i) => write!(f, "skills.{c}.items.{i}.icon"),
            Region::SkillName(c, i) => write!(f, "skills.{c}.items.{i}.name"),
            Region::SkillLevel(c, i) => write!(f, "skills.{c}.items.{i}.level"),
            Region::ContactEmail => f.write_str("contact.email"),
            Region::ContactPhone => f.write_str("contact.phone"),
            Region::ContactLocation => f.write_str("contact.location"),
            Region::FooterCopyright => f.write_str("footer.copyright"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region `{0}`")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        fn idx(p: &str) -> Option<usize> {
            p.parse().ok()
        }
        let region = match parts.as_slice() {
            ["hero", "title"] => Some(Region::HeroTitle),
            ["hero", "description"] => Some(Region::HeroDescription),
            ["hero", "primaryButton"] => Some(Region::HeroPrimaryButton),
            ["hero", "secondaryButton"] => Some(Region::HeroSecondaryButton),
            ["about", "heading"] => Some(Region::AboutHeading),
            ["about", "description"] => Some(Region::AboutDescription),
            ["about", "stats", i, "number"] => idx(i).map(Region::StatNumber),
            ["about", "stats", i, "label"] => idx(i).map(Region::StatLabel),
            ["projects", i, "icon"] => idx(i).map(Region::ProjectIcon),
            ["projects", i, "title"] => idx(i).map(Region::ProjectTitle),
            ["projects", i, "description"] => idx(i).map(Region::ProjectDescription),
            ["projects", i, "demoLink"] => idx(i).map(Region::ProjectDemoLink),
            ["projects", i, "codeLink"] => idx(i).map(Region::ProjectCodeLink),
            ["projects", i, "tech", j] => {
                idx(i).zip(idx(j)).map(|(i, j)| Region::ProjectTech(i, j))
            }
            ["skills", c, "title"] => idx(c).map(Region::SkillCategoryTitle),
            ["skills", c, "items", i, "icon"] => {
                idx(c).zip(idx(i)).map(|(c, i)| Region::SkillIcon(c, i))
            }
            ["skills", c, "items", i, "name"] => {
                idx(c).zip(idx(i)).map(|(c, i)| Region::SkillName(c, i))
            }
            ["skills", c, "items", i, "level"] => {
                idx(c).zip(idx(i)).map(|(c, i)| Region::SkillLevel(c, i))
            }
            ["contact", "email"] => Some(Region::ContactEmail),
            ["contact", "phone"] => Some(Region::ContactPhone),
            ["contact", "location"] => Some(Region::ContactLocation),
            ["footer", "copyright"] => Some(Region::FooterCopyright),
            [section, "title"] => Section::from_key(section).map(Region::SectionTitle),
            [section, "subtitle"] => Section::from_key(section).map(Region::SectionSubtitle),
            _ => None,
        };
        region.ok_or_else(|| UnknownRegion(s.trim().to_string()))
    }
}

/// Repeated groups whose length is decided by the page, not the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Stats,
    Projects,
    ProjectTech(usize),
    SkillCategories,
    Skills(usize),
}

/// The rendered page as the content flow sees it.
pub trait EditableSurface {
    fn text(&self, region: Region) -> Option<String>;
    /// Returns false (and changes nothing) when the region does not exist.
    fn set_text(&mut self, region: Region, value: &str) -> bool;
    fn count(&self, list: ListKind) -> usize;
    fn set_editable(&mut self, editable: bool);
    fn is_editable(&self) -> bool;
}

/// In-memory surface: a flat map of region → text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionMap {
    regions: BTreeMap<Region, String>,
    editable: bool,
}

impl RegionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a region (with its initial text). Only declared regions can be
    /// written by `set_text`.
    pub fn insert(&mut self, region: Region, value: impl Into<String>) -> &mut Self {
        self.regions.insert(region, value.into());
        self
    }

    pub fn with(mut self, region: Region, value: impl Into<String>) -> Self {
        self.insert(region, value);
        self
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Region, &String)> {
        self.regions.iter()
    }

    /// Regions the user may type into while admin mode is on.
    pub fn editable_regions(&self) -> Vec<Region> {
        if !self.editable {
            return Vec::new();
        }
        self.regions
            .keys()
            .filter(|r| r.is_text_editable())
            .copied()
            .collect()
    }

    fn has_any(&self, regions: &[Region]) -> bool {
        regions.iter().any(|r| self.regions.contains_key(r))
    }

    fn consecutive(&self, regions_at: impl Fn(usize) -> Vec<Region>) -> usize {
        (0..).take_while(|&i| self.has_any(&regions_at(i))).count()
    }
}

impl EditableSurface for RegionMap {
    fn text(&self, region: Region) -> Option<String> {
        self.regions.get(&region).cloned()
    }

    fn set_text(&mut self, region: Region, value: &str) -> bool {
        match self.regions.get_mut(&region) {
            Some(slot) => {
                *slot = value.to_string();
                true
            }
            None => false,
        }
    }

    fn count(&self, list: ListKind) -> usize {
        match list {
            ListKind::Stats => {
                self.consecutive(|i| vec![Region::StatNumber(i), Region::StatLabel(i)])
            }
            ListKind::Projects => self.consecutive(|i| {
                vec![
                    Region::ProjectTitle(i),
                    Region::ProjectDescription(i),
                    Region::ProjectIcon(i),
                    Region::ProjectDemoLink(i),
                    Region::ProjectCodeLink(i),
                ]
            }),
            ListKind::ProjectTech(p) => self.consecutive(|i| vec![Region::ProjectTech(p, i)]),
            ListKind::SkillCategories => {
                self.consecutive(|i| vec![Region::SkillCategoryTitle(i)])
            }
            ListKind::Skills(c) => self.consecutive(|i| {
                vec![
                    Region::SkillName(c, i),
                    Region::SkillIcon(c, i),
                    Region::SkillLevel(c, i),
                ]
            }),
        }
    }

    fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    fn is_editable(&self) -> bool {
        self.editable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_text_only_touches_declared_regions() {
        let mut m = RegionMap::new().with(Region::HeroTitle, "Hi");
        assert!(m.set_text(Region::HeroTitle, "Hello"));
        assert!(!m.set_text(Region::FooterCopyright, "x"));
        assert_eq!(m.text(Region::HeroTitle).as_deref(), Some("Hello"));
        assert_eq!(m.text(Region::FooterCopyright), None);
    }

    #[test]
    fn counts_follow_consecutive_indices() {
        let m = RegionMap::new()
            .with(Region::StatNumber(0), "10+")
            .with(Region::StatLabel(1), "Projects")
            .with(Region::StatNumber(3), "gap")
            .with(Region::ProjectTech(0, 0), "Rust")
            .with(Region::ProjectTech(0, 1), "SQL");
        assert_eq!(m.count(ListKind::Stats), 2);
        assert_eq!(m.count(ListKind::ProjectTech(0)), 2);
        assert_eq!(m.count(ListKind::ProjectTech(1)), 0);
    }

    #[test]
    fn region_keys_parse_back() {
        for r in [
            Region::HeroPrimaryButton,
            Region::SectionSubtitle(Section::Skills),
            Region::StatLabel(2),
            Region::ProjectTech(1, 3),
            Region::SkillLevel(0, 4),
            Region::FooterCopyright,
        ] {
            assert_eq!(r.to_string().parse::<Region>(), Ok(r));
        }
        assert_eq!(
            "hero.subtitle".parse::<Region>(),
            Err(UnknownRegion("hero.subtitle".into()))
        );
        assert!("projects.x.title".parse::<Region>().is_err());
    }

    #[test]
    fn editable_regions_skip_links_and_icons() {
        let mut m = RegionMap::new()
            .with(Region::ProjectTitle(0), "A")
            .with(Region::ProjectDemoLink(0), "#");
        assert!(m.editable_regions().is_empty());
        m.set_editable(true);
        assert_eq!(m.editable_regions(), vec![Region::ProjectTitle(0)]);
    }
}
