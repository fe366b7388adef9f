use super::tree::{DocumentTree, Query};

pub const PLAN: Query = Query::tag("div").class("speiseplan");
pub const DATE: Query = Query::tag("div").class("speiseplan_date");

/// One day of a week plan: its date label and the sibling elements that hold its counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Day<N> {
    pub label: String,
    pub sections: Vec<N>,
}

pub fn is_week_plan<T: DocumentTree>(tree: &T) -> bool {
    tree.find_all(tree.root(), &DATE).len() > 1
}

/// Splits the plan's `div` children into days; each date div opens a new day.
/// Sections before the first date land in a day with an empty label.
pub fn split_days<T: DocumentTree>(tree: &T) -> Vec<Day<T::Node>> {
    let Some(plan) = tree.find_all(tree.root(), &PLAN).into_iter().next() else {
        log::debug!("no {PLAN} element on the page");
        return vec![];
    };
    let mut days: Vec<Day<T::Node>> = vec![];
    for child in tree.children(plan) {
        if !tree.tag_name(child).eq_ignore_ascii_case("div") {
            continue;
        }
        if tree.matches(child, &DATE) {
            days.push(Day {
                label: tree.text(child).trim().to_owned(),
                sections: vec![],
            });
            continue;
        }
        match days.last_mut() {
            Some(day) => day.sections.push(child),
            None => days.push(Day {
                label: String::new(),
                sections: vec![child],
            }),
        }
    }
    days
}
