//! Table de référence médicale, une entrée par type de carence

use crate::models::DeficiencyType;

/// Texte de référence pour un type de carence
#[derive(Debug, PartialEq, Eq)]
pub struct DeficiencyReference {
    pub name: &'static str,
    pub symptoms: &'static [&'static str],
    pub causes: &'static [&'static str],
    pub recommendations: &'static [&'static str],
}

static VITAMIN_A: DeficiencyReference = DeficiencyReference {
    name: "Vitamin A",
    symptoms: &[
        "Night blindness or difficulty seeing in low light",
        "Dry eyes (xerophthalmia)",
        "Dry, scaly skin",
        "Frequent infections",
        "Delayed wound healing",
    ],
    causes: &[
        "Inadequate dietary intake (lack of liver, fish, dairy, orange vegetables)",
        "Malabsorption disorders (celiac disease, Crohn's disease)",
        "Zinc deficiency (zinc is needed for vitamin A metabolism)",
        "Alcoholism",
    ],
    recommendations: &[
        "Increase consumption of vitamin A-rich foods (sweet potatoes, carrots, spinach, liver)",
        "Consider vitamin A supplement (2500-5000 IU daily) under medical supervision",
        "Treat any underlying malabsorption conditions",
        "Get follow-up blood test in 8-12 weeks",
        "Avoid excessive vitamin A intake which can be toxic",
    ],
};

static VITAMIN_B: DeficiencyReference = DeficiencyReference {
    name: "Vitamin B",
    symptoms: &[
        "Fatigue and weakness",
        "Pale or yellowish skin",
        "Tingling or numbness in hands/feet",
        "Mouth ulcers",
        "Irritability or depression",
    ],
    causes: &[
        "Poor diet lacking in whole grains, meat, eggs",
        "Pernicious anemia (B12 absorption issue)",
        "Alcoholism",
        "Certain medications (PPIs, metformin)",
        "Autoimmune disorders",
    ],
    recommendations: &[
        "Consume more B-vitamin rich foods (whole grains, eggs, meat, leafy greens)",
        "Consider B-complex supplement",
        "For B12 deficiency, may need sublingual tablets or injections",
        "Address any underlying absorption issues",
        "Limit alcohol consumption",
    ],
};

static VITAMIN_C: DeficiencyReference = DeficiencyReference {
    name: "Vitamin C",
    symptoms: &[
        "Easy bruising",
        "Slow wound healing",
        "Bleeding gums",
        "Dry, rough, scaly skin",
        "Weak immune system",
    ],
    causes: &[
        "Diet lacking fresh fruits and vegetables",
        "Smoking (increases vitamin C requirements)",
        "Malabsorption disorders",
        "Alcoholism",
        "Extreme dieting",
    ],
    recommendations: &[
        "Increase consumption of citrus fruits, berries, peppers",
        "Consider vitamin C supplement (500-1000 mg daily)",
        "Stop smoking if applicable",
        "Cook vegetables lightly to preserve vitamin C",
        "Monitor symptoms for improvement",
    ],
};

static VITAMIN_D: DeficiencyReference = DeficiencyReference {
    name: "Vitamin D",
    symptoms: &[
        "Bone pain or tenderness",
        "Muscle weakness",
        "Fatigue and tiredness",
        "Frequent infections",
        "Depression or mood changes",
    ],
    causes: &[
        "Limited sunlight exposure",
        "Darker skin pigmentation",
        "Obesity (vitamin D gets sequestered in fat)",
        "Malabsorption disorders",
        "Strict vegan diet without supplementation",
    ],
    recommendations: &[
        "Get 15-30 minutes of sunlight daily (arms and legs exposed)",
        "Take vitamin D3 supplement (2000-5000 IU daily)",
        "Consume vitamin D-rich foods (fatty fish, fortified dairy)",
        "Have follow-up blood test in 3 months",
        "Consider calcium supplement if levels are also low",
    ],
};

static VITAMIN_E: DeficiencyReference = DeficiencyReference {
    name: "Vitamin E",
    symptoms: &[
        "Peripheral neuropathy",
        "Muscle weakness",
        "Vision problems",
        "Immune system impairment",
        "Dry, damaged skin",
    ],
    causes: &[
        "Fat malabsorption disorders (cystic fibrosis, liver disease)",
        "Very low-fat diets",
        "Genetic disorders (abetalipoproteinemia)",
        "Premature infants",
        "Long-term parenteral nutrition",
    ],
    recommendations: &[
        "Increase consumption of nuts, seeds, and vegetable oils",
        "Consider vitamin E supplement (100-400 IU daily)",
        "Address any underlying fat absorption issues",
        "Use vitamin E oil for skin issues",
        "Monitor neurological symptoms",
    ],
};

/// Entrée de référence pour un type donné
pub fn reference(kind: DeficiencyType) -> &'static DeficiencyReference {
    match kind {
        DeficiencyType::A => &VITAMIN_A,
        DeficiencyType::B => &VITAMIN_B,
        DeficiencyType::C => &VITAMIN_C,
        DeficiencyType::D => &VITAMIN_D,
        DeficiencyType::E => &VITAMIN_E,
    }
}

/// Recherche par lettre brute; un type inconnu retombe sur la vitamine A.
pub fn lookup(raw: &str) -> &'static DeficiencyReference {
    reference(DeficiencyType::parse_or_default(raw))
}
