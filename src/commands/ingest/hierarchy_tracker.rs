/// The six outline tiers of a French legal code, top-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HierarchyLevel {
    Partie,
    Livre,
    Titre,
    Chapitre,
    Section,
    SousSection,
}

impl HierarchyLevel {
    pub(crate) const ALL: [HierarchyLevel; 6] = [
        HierarchyLevel::Partie,
        HierarchyLevel::Livre,
        HierarchyLevel::Titre,
        HierarchyLevel::Chapitre,
        HierarchyLevel::Section,
        HierarchyLevel::SousSection,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Partie => 0,
            Self::Livre => 1,
            Self::Titre => 2,
            Self::Chapitre => 3,
            Self::Section => 4,
            Self::SousSection => 5,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Partie => "partie",
            Self::Livre => "livre",
            Self::Titre => "titre",
            Self::Chapitre => "chapitre",
            Self::Section => "section",
            Self::SousSection => "sous_section",
        }
    }

    /// Label used in breadcrumbs.
    pub(crate) fn display_name(self) -> &'static str {
        match self {
            Self::Partie => "Partie",
            Self::Livre => "Livre",
            Self::Titre => "Titre",
            Self::Chapitre => "Chapitre",
            Self::Section => "Section",
            Self::SousSection => "Sous-section",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LevelSlot {
    value: Option<String>,
    title: Option<String>,
}

/// Current position in the outline of one document.
///
/// Assigning a level always clears every level below it, value and title,
/// even when the new value equals the old one. The level's own title is only
/// replaced when a non-empty title comes with the assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HierarchyTracker {
    slots: [LevelSlot; 6],
}

impl HierarchyTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn apply(&mut self, level: HierarchyLevel, value: &str, title: Option<&str>) {
        let position = level.index();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if index == position {
                slot.value = Some(value.to_string());
                if let Some(title) = title.map(str::trim).filter(|title| !title.is_empty()) {
                    slot.title = Some(title.to_string());
                }
            } else if index > position {
                *slot = LevelSlot::default();
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn value(&self, level: HierarchyLevel) -> Option<&str> {
        self.slots
            .get(level.index())
            .and_then(|slot| slot.value.as_deref())
    }

    #[cfg(test)]
    pub(crate) fn title(&self, level: HierarchyLevel) -> Option<&str> {
        self.slots
            .get(level.index())
            .and_then(|slot| slot.title.as_deref())
    }

    pub(crate) fn snapshot(&self) -> Vec<String> {
        HierarchyLevel::ALL
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(level, slot)| {
                let value = slot.value.as_deref().filter(|value| !value.is_empty())?;
                Some(match slot.title.as_deref() {
                    Some(title) => format!("{} {} - {}", level.display_name(), value, title),
                    None => format!("{} {}", level.display_name(), value),
                })
            })
            .collect()
    }

    pub(crate) fn snapshot_string(&self) -> String {
        self.snapshot().join(" > ")
    }
}
