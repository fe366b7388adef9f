use std::fmt::Display;

use bitflags::bitflags;

use super::tree::{DocumentTree, Query};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DietaryTag {
    Vegetarian,
    Vegan,
}

impl DietaryTag {
    pub const ALL: [Self; 2] = [Self::Vegetarian, Self::Vegan];

    /// Label as published by the cafeteria, also the icon's file stem.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Vegetarian => "Veggi",
            Self::Vegan => "Vegan",
        }
    }

    pub const fn icon_file(self) -> &'static str {
        match self {
            Self::Vegetarian => "Veggi.png",
            Self::Vegan => "Vegan.png",
        }
    }

    const fn flag(self) -> DietaryFlags {
        match self {
            Self::Vegetarian => DietaryFlags::Vegetarian,
            Self::Vegan => DietaryFlags::Vegan,
        }
    }
}

impl Display for DietaryTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.label())
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DietaryFlags: u8 {
        const Vegetarian = 1;
        const Vegan = 1 << 1;
    }
}

impl DietaryFlags {
    // each tag is checked on its own, a path naming both icons yields both
    pub fn from_icon_src(src: &str) -> Self {
        DietaryTag::ALL
            .into_iter()
            .filter(|tag| src.contains(tag.icon_file()))
            .fold(Self::empty(), |acc, tag| acc | tag.flag())
    }

    pub fn tags(self) -> impl Iterator<Item = DietaryTag> {
        DietaryTag::ALL
            .into_iter()
            .filter(move |tag| self.contains(tag.flag()))
    }
}

/// Dietary markers keyed by the element they are rendered in front of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotations<N> {
    marks: Vec<(N, DietaryTag)>,
}

impl<N> Default for Annotations<N> {
    fn default() -> Self {
        Self { marks: vec![] }
    }
}

impl<N: Copy + PartialEq> Annotations<N> {
    pub fn push(&mut self, node: N, tag: DietaryTag) {
        self.marks.push((node, tag));
    }

    pub fn markers_for(&self, node: N) -> impl Iterator<Item = DietaryTag> + '_ {
        self.marks
            .iter()
            .filter(move |(n, _)| *n == node)
            .map(|(_, tag)| *tag)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

pub const ICON_CONTAINER: Query = Query::tag("div").class("vegan_icon");
/// The Mensaria page puts its icons straight into the dish name block.
pub const MENSARIA_ICON_CONTAINER: Query = Query::tag("div").class("spmenuname");
const DISH_LABEL: Query = Query::tag("span");
const ICON_TO_DISH_DEPTH: usize = 2;

/// Collects the dietary markers implied by the icons below `containers`.
///
/// Every element child of a container is an icon; icons without a `src` are skipped.
/// The markers of an icon attach to each `span` below the icon's grandparent,
/// in the order the icons appear.
pub fn annotate<T: DocumentTree>(tree: &T, containers: &[Query]) -> Annotations<T::Node> {
    let mut annotations = Annotations::default();
    for container_query in containers {
        for container in tree.find_all(tree.root(), container_query) {
            for icon in tree.children(container) {
                let Some(src) = tree.attr(icon, "src") else {
                    continue;
                };
                let flags = DietaryFlags::from_icon_src(src);
                if flags.is_empty() {
                    continue;
                }
                let Some(dish) = tree.ancestor(icon, ICON_TO_DISH_DEPTH) else {
                    continue;
                };
                let labels = tree.find_all(dish, &DISH_LABEL);
                for tag in flags.tags() {
                    for &label in &labels {
                        annotations.push(label, tag);
                    }
                }
            }
        }
    }
    log::debug!("collected {} dietary markers", annotations.len());
    annotations
}
