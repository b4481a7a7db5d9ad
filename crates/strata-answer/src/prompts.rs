//! Prompt texts and fixed user-facing messages.
//!
//! One [`PromptConfig`] is owned by the arbiter and lent to both generators,
//! so the grounded and the reasoner paths can never disagree on the refusal
//! token or the wording of the fixed messages.

use serde::{Deserialize, Serialize};

use crate::selector::Evidence;

/// Label preceding every chunk in a grounded context block.
pub fn layer_label(layer: strata_core::types::Layer) -> String {
    format!("[LAYER: {}]", layer)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Rules for the grounded generator: context only, no layer mixing,
    /// reply with the refusal token when the context is insufficient.
    pub system_rules: String,
    pub reasoner_system: String,
    pub reasoner_wrapper: String,
    /// Substring that marks a grounded reply as self-declared ungrounded.
    pub refusal_token: String,
    pub empty_input_message: String,
    pub reasoner_unavailable_message: String,
    /// Returned when the reasoner answers with an empty completion.
    pub sparse_space_message: String,
    /// Note the reasoner must attach to a calibration score of 1.
    pub calibration_caution_note: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_rules: SYSTEM_RULES.trim().to_string(),
            reasoner_system: REASONER_SYSTEM.trim().to_string(),
            reasoner_wrapper: REASONER_WRAPPER.trim().to_string(),
            refusal_token: "NEDOLOŽENO".to_string(),
            empty_input_message: "Prázdný dotaz.".to_string(),
            reasoner_unavailable_message: "Reasoner dočasně nedostupný.".to_string(),
            sparse_space_message: "Epistemický prostor je příliš řídký pro smysluplnou inferenci.".to_string(),
            calibration_caution_note: "NOTE: vysoká míra spekulace, označeno jako Modelový prior.".to_string(),
        }
    }
}

impl PromptConfig {
    pub fn grounded_prompt(&self, context: &str, question: &str) -> String {
        format!("{}\n\nKONTEXT:\n{}\n\nOTÁZKA:\n{}\n", self.system_rules, context, question)
    }

    pub fn reasoner_prompt(&self, question: &str) -> String {
        format!("{}\n\n{}\n\nOTÁZKA:\n{}\n", self.reasoner_system, self.reasoner_wrapper, question)
    }

    pub fn is_refusal(&self, completion: &str) -> bool {
        !self.refusal_token.is_empty() && completion.contains(&self.refusal_token)
    }
}

/// Evidence rendered as labeled blocks, in the given order, blank-line separated.
pub fn render_context(evidence: &[Evidence]) -> String {
    evidence
        .iter()
        .map(|e| format!("{}\n{}", layer_label(e.chunk.layer), e.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

const SYSTEM_RULES: &str = "
Odpovídej POUZE z poskytnutého kontextu.

Nesmíš doplňovat externí znalosti.
Nesmíš míchat epistemické vrstvy.
Každý úsek kontextu je označen [LAYER: raw|synth|meta]; tvrzení z různých vrstev drž odděleně.

Pokud kontext nestačí, odpověz přesně:
NEDOLOŽENO - odpověď není v datech.

Nikdy nespekuluj.
";

const REASONER_SYSTEM: &str = "
KONTEXT (ukotvi všechny odpovědi sem):
Uživatel je tvůrce digitálního obsahu, který právě zažil PRVNÍ VELKÝ VIRÁL (např. video s ~1M zhlédnutí). Fáze: RANÁ VIRÁLNÍ EXPOZICE.

Typické rysy této fáze:
- malá mediální zkušenost, omezená smluvní a právní gramotnost
- vysoká emoční aktivace, zhuštěný čas pro rozhodování
- náhlé nabídky, exploatativní aktéři
- rozhodnutí často pod kognitivním přetížením

POVOLENÉ ČINNOSTI:
- Mapovat RIZIKOVÝ PROSTOR a MOŽNÉ KROKY (mapa, ne rady).
- Použít znalosti z kognitivní psychologie, behaviorální ekonomie, decision science, sociální dynamiky a reputační mechaniky.
- Chybí-li lokální důkazy, lze inferovat pouze s jasným štítkem \"Modelový prior\".

ZAKÁZÁNO:
- Předepisovat právní, lékařská nebo sportovní doporučení.
- Deterministicky předpovídat osud jediné osoby (\"bude\", \"nikdy\").
- Používat motivující či marketingový jazyk.
- Míchat epistemické vrstvy (RAW/SYNTH/META) bez explicitního označení.

EPISTEMICKÁ PRAVIDLA (povinná pro každé tvrzení):
- TYPE: {Modelový prior | Strong generalization | Weak inference | Speculation}
- CERTAINTY: {nízká | střední | vyšší}
- SIGNAL: {WEAK | MODERATE | STRONG}
- MEDIÁN (base rate): 1 věta
- EXTRÉM (tail): 1 věta
- HRANICE POZNÁNÍ: 1 věta (co nevíme)

TÓN:
Analytický, stručný, nepreskriptivní. Výstup pouze česky, krátké věty, hodně bílého místa.
";

const REASONER_WRAPPER: &str = "
VÝSTUPNÍ ŠABLONA (přesně dodržet):

TITUL: <krátký název, nejvýše 6 slov>

MAPA - CO SE PRAVDĚPODOBNĚ DĚJE
(3 až 6 karet, každá přesně v tomto formátu)

Mechanismus: <název>
TYPE: <Modelový prior|Strong generalization|Weak inference|Speculation>
CERTAINTY: <nízká|střední|vyšší>
SIGNAL: <WEAK|MODERATE|STRONG>
MEDIÁN: <jedna krátká věta>
EXTRÉM: <jedna krátká věta>
HRANICE POZNÁNÍ: <jedna krátká věta>

CO JE NEZNÁMO:
• <krátký bod>
• <krátký bod>

KDE BY ŠLA ZÍSKAT JISTOTA:
• <konkrétní dokument nebo metoda>
• <konkrétní dokument nebo metoda>

CO Z TOHO PLYNE: \"NEDOSTATEČNÁ DATA\" NEBO \"MOŽNÉ KROKY (mapa, ne rada)\"

CALIBRATION SCORE: <1|2|3> - <jedna věta důvod>

DALŠÍ PRAVIDLA:
- NIKDY nemíchej pozorovaná data a Modelový prior ve stejné větě.
- Pokud CALIBRATION SCORE = 1, přidej poznámku: \"NOTE: vysoká míra spekulace, označeno jako Modelový prior.\"
- Nikdy nevyplňuj šablonu nevěrohodným tvrzením; chybí-li data, napiš \"NEDOSTATEČNÁ DATA\".
";
