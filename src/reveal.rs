use crate::config::RevealPolicy;
use crate::surface::ElementId;

pub const ANIMATABLE_SELECTOR: &str = ".reveal-text, .fade-in-up, .word-split, .line-reveal, \
     .stagger-children, .stat-number, .char-reveal, .brand-fullname";
pub const STAT_NUMBER_CLASS: &str = "stat-number";
pub const HERO_TEXT_CLASSES: [&str; 2] = ["char-reveal", "brand-fullname"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Generic,
    StatNumber { target: u64 },
    HeroText,
}

impl Category {
    pub fn classify(has_class: impl Fn(&str) -> bool, target: impl FnOnce() -> u64) -> Self {
        if has_class(STAT_NUMBER_CLASS) {
            Self::StatNumber { target: target() }
        } else if HERO_TEXT_CLASSES.into_iter().any(&has_class) {
            Self::HeroText
        } else {
            Self::Generic
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealEffect {
    Show(ElementId),
    Hide(ElementId),
    StartCounter { element: ElementId, target: u64 },
    ResetCounter(ElementId),
}

#[derive(Debug)]
struct Tracked {
    category: Category,
    visible: bool,
    counted: bool,
}

#[derive(Debug)]
pub struct RevealEngine {
    policy: RevealPolicy,
    elements: Vec<Tracked>,
}

impl RevealEngine {
    pub fn new(policy: RevealPolicy) -> Self {
        Self {
            policy,
            elements: Vec::new(),
        }
    }

    pub fn policy(&self) -> RevealPolicy {
        self.policy
    }

    pub fn register(&mut self, category: Category) -> ElementId {
        self.elements.push(Tracked {
            category,
            visible: false,
            counted: false,
        });
        ElementId(self.elements.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_visible(&self, element: ElementId) -> bool {
        self.elements
            .get(element.0)
            .map(|tracked| tracked.visible)
            .unwrap_or(false)
    }

    pub fn is_counted(&self, element: ElementId) -> bool {
        self.elements
            .get(element.0)
            .map(|tracked| tracked.counted)
            .unwrap_or(false)
    }

    pub fn observe(&mut self, element: ElementId, intersecting: bool) -> Vec<RevealEffect> {
        let policy = self.policy;
        let Some(tracked) = self.elements.get_mut(element.0) else {
            return Vec::new();
        };

        if intersecting {
            return enter(element, tracked);
        }

        let keeps_reveal = policy == RevealPolicy::Sticky
            && tracked.visible
            && !matches!(tracked.category, Category::Generic);
        if keeps_reveal {
            return Vec::new();
        }

        let mut effects = Vec::new();
        if tracked.visible {
            tracked.visible = false;
            effects.push(RevealEffect::Hide(element));
        }

        if let Category::StatNumber { .. } = tracked.category {
            if policy == RevealPolicy::Replay {
                tracked.counted = false;
                effects.push(RevealEffect::ResetCounter(element));
            }
        }

        effects
    }

    pub fn reveal_hero(&mut self) -> Vec<RevealEffect> {
        self.elements
            .iter_mut()
            .enumerate()
            .filter(|(_, tracked)| tracked.category == Category::HeroText && !tracked.visible)
            .map(|(index, tracked)| {
                tracked.visible = true;
                RevealEffect::Show(ElementId(index))
            })
            .collect()
    }
}

fn enter(element: ElementId, tracked: &mut Tracked) -> Vec<RevealEffect> {
    let mut effects = Vec::new();

    if !tracked.visible {
        tracked.visible = true;
        effects.push(RevealEffect::Show(element));
    }

    if let Category::StatNumber { target } = tracked.category {
        if !tracked.counted {
            tracked.counted = true;
            effects.push(RevealEffect::StartCounter { element, target });
        }
    }

    effects
}
