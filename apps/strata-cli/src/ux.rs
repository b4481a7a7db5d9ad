//! Chat-surface texts and the question pre-check.

use strata_core::types::Layer;

const ADVICE_PHRASES: [&str; 4] = ["co mám dělat", "mám to vzít", "poradíš", "pomoz"];

const GENERAL_NOTE: &str = "Poznámka: Dotaz je velmi obecný. Systém pracuje lépe s otázkami typu \
                            „jaké vzorce“, „co bylo pozorováno“, „co nevíme“.";

const NO_ADVICE_NOTE: &str = "Poznámka: Tento nástroj neposkytuje rady. \
                              Odpovídá pouze popisem pozorovaných jevů a vzorců.";

/// A note to print before the answer, if the question is likely to go badly.
/// The advice note takes precedence over the too-general one.
pub fn precheck(question: &str) -> Option<&'static str> {
    let q = question.trim();
    let lower = q.to_lowercase();
    if ADVICE_PHRASES.iter().any(|p| lower.contains(p)) {
        return Some(NO_ADVICE_NOTE);
    }
    if q.split_whitespace().count() < 3 {
        return Some(GENERAL_NOTE);
    }
    None
}

pub const HELP: &str = "\
Tento nástroj odpovídá pouze na otázky typu:

• co bylo pozorováno / zaznamenáno
• jaké vzorce se opakují
• co nevíme / kde jsou zkreslení

Příklady:
– Jaké události se po prvním virálu objevují nejčastěji?
– Jaké reakce lidí se opakují napříč případy?
– Co v příbězích o virálním úspěchu systematicky chybí?";

pub const LAYERS: &str = "\
RAW = pouze pozorovatelné jevy
SYNTH = opakující se vzorce bez hodnocení
META = limity poznání a zkreslení
Pokud odpověď není v datech → NEDOLOŽENO";

pub fn example_questions(layer: Layer) -> &'static [&'static str] {
    match layer {
        Layer::Raw => &[
            "Jaké události byly po prvním virálu pozorovány?",
            "Jaké typy následků se objevily po virální expozici?",
            "Jaké zásahy platforem byly po virálu zaznamenány?",
            "Jaké smluvní kroky lidé učinili krátce po virálu?",
            "Jaké změny v zaměstnání byly po virálu zaznamenány?",
            "Jaké bezpečnostní incidenty se po virálu objevily?",
        ],
        Layer::Synth => &[
            "Jaké reakce lidí se po virálním zásahu opakují?",
            "Jak se mění chování tvůrců po náhlé viditelnosti?",
            "Jaké vzorce se objevují v rozhodování po virálu?",
            "Jak se mění vztah mezi obsahem a osobou?",
            "Jak se mění sociální okruh po virální události?",
            "Jak se pozornost přesouvá po virálním zásahu?",
        ],
        Layer::Meta => &[
            "Co o lidech po virálu systematicky nevíme?",
            "Jaká data o virálním úspěchu chybí?",
            "Kde jsou zkreslení ve viditelných příbězích?",
            "Proč nelze z minulých případů predikovat vývoj?",
            "Jaká slepá místa mají retrospektivní výpovědi?",
            "Jaké informace tvůrci nemají k dispozici?",
        ],
    }
}

pub fn render_examples() -> String {
    Layer::ALL
        .iter()
        .map(|&layer| {
            let lines: Vec<String> = example_questions(layer).iter().map(|q| format!("  {q}")).collect();
            format!("[{}]\n{}", layer.as_str().to_uppercase(), lines.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub const TOPICS: &str = "\
# TRAJEKTORIE POZORNOSTI

1. Roste moje viditelnost rychleji než moje schopnost ji unést?
2. Je současná pozornost stabilní jev, nebo krátkodobý spike?
3. Co se stane s mou identitou, pokud pozornost zmizí stejně rychle, jako přišla?
4. Reaguje publikum na obsah, nebo už reaguje na mě jako osobu?
5. Kolik kontroly mám nad tím, proč mě lidé sledují?
6. Co se změní, pokud se narativ kolem mé osoby otočí?
7. Jak by vypadal stejný virál bez algoritmického boostu?

# ROZHODOVÁNÍ POD TLAKEM

8. Rozhoduji se jinak než před měsícem?
9. Kolik času si reálně dávám na velká rozhodnutí?
10. Je pocit urgence skutečný, nebo sociálně vytvořený?
11. Která rozhodnutí dělám bez plného porozumění následků?
12. Jak by tato volba vypadala, kdyby nebyla žádná viralita?
13. Reaguji, nebo vybírám?
14. Co dnes považuji za „neopakovatelnou příležitost“?

# PERCEPČNÍ ZKRESLENÍ

15. Zaměňuji viditelnost za hodnotu?
16. Zaměňuji růst publika za důkaz kompetence?
17. Jak by mé současné kroky hodnotilo mé „předvirální já“?
18. Věřím signálům, nebo datům?
19. Kolik mého sebeobrazu je teď závislé na metrikách?
20. Reaguji více na realitu, nebo na komentáře?
21. Jak moc se změnilo mé vnímání rizika?

# NABÍDKY A ASYMETRIE

22. Kdo má z této nabídky strukturálně větší výhodu?
23. Rozumím motivaci druhé strany, nebo ji jen odhaduji?
24. Proč tato nabídka existuje právě teď?
25. Co ví druhá strana, co já nevím?
26. Které závazky mohou přežít samotnou viralitu?
27. Kolik prostoru mám říct „ne“?
28. Jak by tato dohoda vypadala bez časového tlaku?

# STRUKTURÁLNÍ NEJISTOTA

29. Jak velká část tohoto prostředí je pro mě neviditelná?
30. Kolik příběhů přeživších formuje mou představu reality?
31. Kdo zmizel, a proč o nich nevím?
32. Jak reprodukovatelný je můj úspěch?
33. Co zde nelze predikovat?
34. Kde operuji čistě v neznámu?

# IDENTITA A HRANICE

35. Kde končím já a začíná moje veřejná persona?
36. Kolik soukromí jsem ochoten vyměnit za růst?
37. Co z dneška bude existovat online i za deset let?
38. Jaké informace už nelze vzít zpět?
39. Buduji obraz, nebo kariéru?
40. Kdo kontroluje narativ o mně?

# ADAPTACE VS. REAKTIVITA

41. Měním strategii, nebo jen hasím reakce publika?
42. Přizpůsobuji obsah, nebo sebe?
43. Jak stabilní je můj současný směr?
44. Co se stane, když přestanu optimalizovat pro odezvu?

# KAPACITA A REALITA

45. Roste objem mých rozhodnutí rychleji než moje mentální kapacita?
46. Kolik prostoru mi zbývá na promyšlené kroky?
47. Kdo mi pomáhá přemýšlet, ne jen reagovat?
48. Zmenšuje se můj svět na digitální prostředí?

# LONG-TERM TRAJEKTORIE

49. Pokud by tato vlna skončila zítra, co mi zůstane?
50. Stavím něco, co přežije samotnou pozornost?";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_questions_get_the_general_note() {
        assert_eq!(precheck("Co teď?"), Some(GENERAL_NOTE));
        assert_eq!(precheck("Jaké vzorce se opakují?"), None);
    }

    #[test]
    fn advice_seeking_wins_over_short() {
        assert_eq!(precheck("Pomoz mi"), Some(NO_ADVICE_NOTE));
        assert_eq!(precheck("Mám to vzít, nebo ne?"), Some(NO_ADVICE_NOTE));
    }

    #[test]
    fn example_questions_route_to_their_layer_family() {
        use strata_answer::{CueFamily, LayerClassifier};
        let classifier = LayerClassifier::default();
        assert_eq!(classifier.classify(example_questions(Layer::Raw)[0]).family, CueFamily::Observation);
        assert_eq!(classifier.classify(example_questions(Layer::Meta)[0]).family, CueFamily::Limits);
    }

    #[test]
    fn examples_cover_every_layer() {
        let text = render_examples();
        for layer in Layer::ALL {
            assert!(text.contains(&format!("[{}]", layer.as_str().to_uppercase())));
        }
    }
}
