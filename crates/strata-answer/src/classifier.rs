//! Keyword classifier mapping a question to the evidence layers it may use.
//!
//! Rules are checked in a fixed order and the first family with a matching
//! cue wins; cues are lowercase substrings of the lowercased question. No
//! embedding or backend call is ever made here.

use strata_core::config::ClassifierSettings;
use strata_core::types::Layer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueFamily {
    Observation,
    Mechanism,
    Limits,
    Default,
}

impl CueFamily {
    pub fn allowed_layers(self) -> &'static [Layer] {
        match self {
            CueFamily::Observation => &[Layer::Raw, Layer::Synth],
            CueFamily::Mechanism => &[Layer::Synth, Layer::Meta],
            CueFamily::Limits => &[Layer::Meta, Layer::Synth],
            CueFamily::Default => &[Layer::Synth],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub family: CueFamily,
    pub allowed: Vec<Layer>,
}

impl Classification {
    pub fn allows(&self, layer: Layer) -> bool {
        self.allowed.contains(&layer)
    }
}

#[derive(Debug, Clone)]
pub struct LayerClassifier {
    rules: Vec<(CueFamily, Vec<String>)>,
}

impl LayerClassifier {
    pub fn new(settings: &ClassifierSettings) -> Self {
        let lower = |cues: &[String]| -> Vec<String> {
            cues.iter().map(|c| c.trim().to_lowercase()).filter(|c| !c.is_empty()).collect()
        };
        Self {
            rules: vec![
                (CueFamily::Observation, lower(&settings.observation_cues)),
                (CueFamily::Mechanism, lower(&settings.mechanism_cues)),
                (CueFamily::Limits, lower(&settings.limits_cues)),
            ],
        }
    }

    pub fn classify(&self, question: &str) -> Classification {
        let q = question.to_lowercase();
        let family = self
            .rules
            .iter()
            .find(|(_, cues)| cues.iter().any(|cue| q.contains(cue.as_str())))
            .map(|(family, _)| *family)
            .unwrap_or(CueFamily::Default);
        Classification { family, allowed: family.allowed_layers().to_vec() }
    }
}

impl Default for LayerClassifier {
    fn default() -> Self {
        Self::new(&ClassifierSettings::default())
    }
}
