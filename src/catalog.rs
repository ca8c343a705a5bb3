//! Narrator personas, tones, voices and language settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Hi,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
        }
    }

    /// Instruction sent with every story prompt.
    pub fn system_instruction(self) -> String {
        let language = match self {
            Language::Hi => "HINDI (Use Devanagari)",
            Language::En => "ENGLISH",
        };
        format!(
            "You are an expert storyteller. Write captivating short stories based on prompts. \n\
             Language: {}.\n\
             150-300 words. Output story ONLY.",
            language
        )
    }

    /// User-facing text for a failed generation.
    pub fn generation_failed_message(self) -> &'static str {
        match self {
            Language::Hi => "कहानी बनाने में विफल। कृपया अपना इंटरनेट या एपीआई कुंजी जांचें।",
            Language::En => "Failed to conjure the story. Please check your connection or API key.",
        }
    }

    pub fn offline_message(self) -> &'static str {
        match self {
            Language::Hi => "ऑफ़लाइन मोड: केवल पिछली कहानियाँ सुनी जा सकती हैं",
            Language::En => "Offline: You can only listen to saved stories",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "hi" | "hindi" => Ok(Language::Hi),
            other => Err(format!("unsupported language: {} (expected en or hi)", other)),
        }
    }
}

/// Prebuilt voices offered by the speech model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum VoiceName {
    Kore,
    Puck,
    Charon,
    Fenrir,
    Zephyr,
}

impl VoiceName {
    pub const ALL: [VoiceName; 5] = [
        VoiceName::Kore,
        VoiceName::Puck,
        VoiceName::Charon,
        VoiceName::Fenrir,
        VoiceName::Zephyr,
    ];

    /// Identifier the provider expects in `prebuiltVoiceConfig.voiceName`.
    pub fn as_str(self) -> &'static str {
        match self {
            VoiceName::Kore => "Kore",
            VoiceName::Puck => "Puck",
            VoiceName::Charon => "Charon",
            VoiceName::Fenrir => "Fenrir",
            VoiceName::Zephyr => "Zephyr",
        }
    }

    pub fn character(self) -> &'static str {
        match self {
            VoiceName::Kore => "Female",
            VoiceName::Puck => "Male",
            VoiceName::Charon => "Deep",
            VoiceName::Fenrir => "Strong",
            VoiceName::Zephyr => "Soft",
        }
    }
}

impl fmt::Display for VoiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub id: &'static str,
    pub label: &'static str,
    pub hindi_label: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
}

impl Tone {
    pub fn display_label(&self, lang: Language) -> &'static str {
        match lang {
            Language::Hi => self.hindi_label,
            Language::En => self.label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarratorPersona {
    pub id: &'static str,
    pub name: &'static str,
    pub hindi_name: &'static str,
    pub voice: VoiceName,
    pub tone: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub lang: Language,
}

impl NarratorPersona {
    pub fn display_name(&self, lang: Language) -> &'static str {
        match lang {
            Language::Hi => self.hindi_name,
            Language::En => self.name,
        }
    }
}

macro_rules! persona {
    ($id:expr, $name:expr, $hindi:expr, $voice:ident, $tone:expr, $emoji:expr, $desc:expr, $lang:ident) => {
        NarratorPersona {
            id: $id,
            name: $name,
            hindi_name: $hindi,
            voice: VoiceName::$voice,
            tone: $tone,
            emoji: $emoji,
            description: $desc,
            lang: Language::$lang,
        }
    };
}

macro_rules! tone {
    ($id:expr, $label:expr, $hindi:expr, $emoji:expr, $desc:expr) => {
        Tone {
            id: $id,
            label: $label,
            hindi_label: $hindi,
            emoji: $emoji,
            description: $desc,
        }
    };
}

pub static PERSONAS: [NarratorPersona; 20] = [
    // 基础音色
    persona!("kore_base", "Kore", "कोरे", Kore, "joyful", "👩", "Standard Female Voice", En),
    persona!("puck_base", "Puck", "पक", Puck, "excited", "🧑", "Standard Male Voice", En),
    persona!("charon_base", "Charon", "चरन", Charon, "wise", "🧔", "Standard Deep Voice", En),
    persona!("fenrir_base", "Fenrir", "फेन्रिर", Fenrir, "heroic", "🐺", "Strong Voice", En),
    persona!("zephyr_base", "Zephyr", "ज़ेफायर", Zephyr, "calm", "🧚", "Soft Voice", En),
    // 印地语主题角色
    persona!("kabira", "Kabir", "कबीर", Charon, "wise", "📜", "Ancient Mystic", Hi),
    persona!("meera", "Meera", "मीरा", Zephyr, "nostalgic", "🪕", "Poetic Soul", Hi),
    persona!("birbal", "Birbal", "बीरबल", Puck, "sarcastic", "🐘", "Witty Advisor", Hi),
    persona!("tenali", "Tenali", "तेनाली", Puck, "mischievous", "🐒", "Clever Joker", Hi),
    persona!("vikram", "Vikram", "विक्रम", Fenrir, "majestic", "⚔️", "Great King", Hi),
    persona!("vetal", "Vetal", "वेताल", Charon, "spooky", "🦇", "Ghost Storyteller", Hi),
    persona!("dadi", "Dadi Maa", "दादी माँ", Kore, "nostalgic", "👵", "Sweet Grandmother", Hi),
    persona!("rani", "Rani Saiba", "रानी साहिबा", Kore, "majestic", "💎", "Royal Queen", Hi),
    persona!("chotu", "Chotu", "छोटू", Puck, "innocent", "🍭", "Childhood Friend", Hi),
    persona!("jadugar", "Jadugar", "जादूगर", Charon, "suspenseful", "🎩", "Mysterious Magician", Hi),
    persona!("sipahi", "Sipahi", "सिपाही", Fenrir, "heroic", "🛡️", "Brave Soldier", Hi),
    persona!("kavi", "Kavi Raj", "कवि राज", Zephyr, "dreamy", "🖋️", "Ethereal Poet", Hi),
    persona!("shanti", "Shanti", "शान्ति", Zephyr, "whispering", "🧘", "Peaceful Guide", Hi),
    persona!("toofan", "Toofaan", "तूफान", Puck, "excited", "🌪️", "Fast Narrator", Hi),
    persona!("ustad", "Ustad", "उस्ताद", Charon, "dramatic", "🎻", "Musical Storyteller", Hi),
];

pub static TONES: [Tone; 15] = [
    tone!("majestic", "Majestic", "शाही", "👑", "Grand and powerful"),
    tone!("whispering", "Whispering", "फुसफुसाते हुए", "🤫", "Quiet and intimate"),
    tone!("joyful", "Joyful", "आनंदपूर्ण", "😊", "Happy and energetic"),
    tone!("spooky", "Spooky", "डरावना", "👻", "Eerie and mysterious"),
    tone!("melancholy", "Melancholy", "उदासी", "😢", "Sad and reflective"),
    tone!("excited", "Excited", "उत्साहित", "🔥", "High energy and fast"),
    tone!("wise", "Wise", "बुद्धिमान", "🧙", "Ancient and knowledgeable"),
    tone!("heroic", "Heroic", "वीरतापूर्ण", "🛡️", "Brave and inspiring"),
    tone!("nostalgic", "Nostalgic", "पुरानी यादें", "🕰️", "Longing and sweet"),
    tone!("sarcastic", "Sarcastic", "व्यंग्यात्मक", "😏", "Witty and sharp"),
    tone!("suspenseful", "Suspenseful", "रोमांचक", "🕵️", "Tense and gripping"),
    tone!("innocent", "Innocent", "मासूम", "👶", "Child-like and pure"),
    tone!("grumpy", "Grumpy", "गुस्सैल", "😠", "Short and irritable"),
    tone!("dreamy", "Dreamy", "स्वप्निल", "☁️", "Floating and ethereal"),
    tone!("dramatic", "Dramatic", "नाटकीय", "🎭", "Theatrical and intense"),
];

/// Look up a persona, falling back to the first one for unknown ids.
pub fn persona_or_default(id: &str) -> &'static NarratorPersona {
    PERSONAS.iter().find(|p| p.id == id).unwrap_or(&PERSONAS[0])
}

pub fn find_tone(id: &str) -> Option<&'static Tone> {
    TONES.iter().find(|t| t.id == id)
}
