use crate::sink::PartSink;
use std::fmt::{self, Debug, Formatter};

/// A sink together with the rule deciding which parts it receives.
pub struct Target<'a> {
    name: String,
    matcher: Matcher<'a>,
    sink: &'a mut dyn PartSink,
}

enum Matcher<'a> {
    Exact,
    Custom(Box<dyn Fn(&str) -> bool + 'a>),
}

impl<'a> Target<'a> {
    /// Receives the parts whose `name` equals `name`.
    pub fn new<N: Into<String>>(name: N, sink: &'a mut dyn PartSink) -> Target<'a> {
        Target {
            name: name.into(),
            matcher: Matcher::Exact,
            sink,
        }
    }

    /// Receives the parts whose `name` satisfies `matcher`. `name` only labels the target.
    pub fn with_matcher<N, F>(name: N, sink: &'a mut dyn PartSink, matcher: F) -> Target<'a>
    where
        N: Into<String>,
        F: Fn(&str) -> bool + 'a,
    {
        Target {
            name: name.into(),
            matcher: Matcher::Custom(Box::new(matcher)),
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, part_name: &str) -> bool {
        match &self.matcher {
            Matcher::Exact => self.name == part_name,
            Matcher::Custom(matcher) => matcher(part_name),
        }
    }
}

impl Debug for Target<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let matcher = match self.matcher {
            Matcher::Exact => "exact",
            Matcher::Custom(_) => "custom",
        };

        f.debug_struct("Target")
            .field("name", &self.name)
            .field("matcher", &matcher)
            .finish()
    }
}

/// Registered targets, frozen in registration order once parsing starts.
#[derive(Debug, Default)]
pub(crate) struct RouteTable<'a> {
    targets: Vec<Target<'a>>,
}

impl<'a> RouteTable<'a> {
    pub(crate) fn new(targets: Vec<Target<'a>>) -> RouteTable<'a> {
        RouteTable { targets }
    }

    /// Index of the first target accepting `part_name`.
    pub(crate) fn route(&self, part_name: &str) -> Option<usize> {
        self.targets.iter().position(|target| target.matches(part_name))
    }

    pub(crate) fn target_name(&self, idx: usize) -> Option<&str> {
        self.targets.get(idx).map(Target::name)
    }

    pub(crate) fn sink_mut(&mut self, idx: usize) -> Option<&mut (dyn PartSink + 'a)> {
        self.targets.get_mut(idx).map(|target| &mut *target.sink)
    }

    pub(crate) fn len(&self) -> usize {
        self.targets.len()
    }
}
