//! Offer Intelligence Report: the structured record produced by the analyzer.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::enums::{FunnelFlow, MarketSophistication};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferAnalysis {
    pub score: f64,
    pub summary: String,
    pub positioning: Positioning,
    pub revenue_model: RevenueModel,
    pub pricing_strategy: PricingStrategy,
    pub upsell_structure: UpsellStructure,
    pub bonus_suggestions: Vec<BonusSuggestion>,
    pub funnel_strategy: FunnelStrategy,
    pub copy_angles: CopyAngles,
    pub funnel_health_score: FunnelHealthScore,
    pub recommendations: Vec<String>,
}

impl OfferAnalysis {
    pub fn first_headline(&self) -> Option<&str> {
        self.copy_angles
            .headlines
            .first()
            .map(String::as_str)
            .filter(|h| !h.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Positioning {
    pub target_audience: String,
    pub primary_pain_point: String,
    pub core_benefit: String,
    #[serde(deserialize_with = "lenient_label")]
    pub market_sophistication: MarketSophistication,
    pub messaging_angles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueModel {
    #[serde(rename = "type")]
    pub model_type: String,
    pub monetization_strategy: String,
    pub conversion_strategy: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingStrategy {
    pub suggested_price_point: String,
    pub reasoning: String,
    pub psychological_hooks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_gap_analysis: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpsellStructure {
    pub recommended_upsells: Vec<RecommendedUpsell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendedUpsell {
    pub offer_name: String,
    pub price_point: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusSuggestion {
    pub name: String,
    pub value_proposition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelStrategy {
    #[serde(deserialize_with = "lenient_label")]
    pub recommended_flow: FunnelFlow,
    pub steps: Vec<FunnelStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelStep {
    pub name: String,
    pub purpose: String,
    pub key_elements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyAngles {
    pub headlines: Vec<String>,
    pub hooks: Vec<String>,
    pub email_subjects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelHealthScore {
    pub clarity: f64,
    pub monetization_depth: f64,
    pub pricing: f64,
    pub overall: f64,
}

/// Read an enum label the way models tend to write it: `problem_aware`,
/// `Problem Aware` and `problem-aware` are the same value. Unknown or
/// missing labels become the default variant.
fn lenient_label<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    let normalized = raw
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_");

    Ok(normalized.parse().unwrap_or_else(|_| {
        tracing::debug!(label = %raw, "Unrecognised label in analysis, using default");
        T::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_default_to_empty() {
        let analysis: OfferAnalysis = serde_json::from_str(
            r#"{"score": 64, "summary": "Solid core offer.", "copy_angles": {"headlines": ["Ship faster"]}}"#,
        )
        .unwrap();

        assert_eq!(analysis.score, 64.0);
        assert!(analysis.bonus_suggestions.is_empty());
        assert!(analysis.recommendations.is_empty());
        assert!(analysis.upsell_structure.recommended_upsells.is_empty());
        assert!(analysis.copy_angles.hooks.is_empty());
        assert_eq!(analysis.first_headline(), Some("Ship faster"));
        assert_eq!(analysis.pricing_strategy.price_gap_analysis, None);
    }

    #[test]
    fn labels_are_read_loosely() {
        let analysis: OfferAnalysis = serde_json::from_str(
            r#"{
                "positioning": {"market_sophistication": "Problem Aware"},
                "funnel_strategy": {"recommended_flow": "Lead-Magnet + Sales"}
            }"#,
        )
        .unwrap();
        assert_eq!(analysis.positioning.market_sophistication, MarketSophistication::ProblemAware);
        assert_eq!(analysis.funnel_strategy.recommended_flow, FunnelFlow::LeadMagnetSales);
    }

    #[test]
    fn unknown_or_null_labels_fall_back_to_default() {
        let analysis: OfferAnalysis = serde_json::from_str(
            r#"{
                "positioning": {"market_sophistication": "very aware"},
                "funnel_strategy": {"recommended_flow": null}
            }"#,
        )
        .unwrap();
        assert_eq!(analysis.positioning.market_sophistication, MarketSophistication::default());
        assert_eq!(analysis.funnel_strategy.recommended_flow, FunnelFlow::default());
    }

    #[test]
    fn canonical_labels_still_serialize_snake_case() {
        let mut analysis = OfferAnalysis::default();
        analysis.positioning.market_sophistication = MarketSophistication::MostAware;
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["positioning"]["market_sophistication"], "most_aware");

        let back: OfferAnalysis = serde_json::from_value(value).unwrap();
        assert_eq!(back, analysis);
    }
}
