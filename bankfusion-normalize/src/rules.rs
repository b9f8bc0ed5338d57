//! Keyword and brand tables shared by every classification stage.
//!
//! All matching runs on upper-cased narration text and respects word
//! boundaries, so `VI` never fires inside `SERVICE` and `HP` never inside
//! `SHPL`. Tables are compiled once per process and shared through an `Arc`.

use crate::merchant::MerchantPatterns;
use bankfusion_core::{Category, Channel};
use regex::Regex;
use std::sync::Arc;

/// Word-boundary alternation over a list of phrases. Spaces inside a phrase
/// match any run of whitespace.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    pattern: Regex,
}

impl KeywordSet {
    pub fn new(words: &[&str]) -> Result<Self, regex::Error> {
        let alts: Vec<String> = words.iter().map(|w| phrase_pattern(w)).collect();
        Ok(Self {
            pattern: Regex::new(&format!(r"\b(?:{})\b", alts.join("|")))?,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

fn phrase_pattern(word: &str) -> String {
    regex::escape(word).replace(' ', r"\s+")
}

/// Ordered keyword groups, each carrying a label. The first group that
/// matches wins.
#[derive(Debug, Clone)]
pub struct LabeledSet<T> {
    entries: Vec<(KeywordSet, T)>,
}

impl<T: Copy> LabeledSet<T> {
    pub fn new(groups: &[(&[&str], T)]) -> Result<Self, regex::Error> {
        let entries = groups
            .iter()
            .map(|(words, label)| Ok((KeywordSet::new(words)?, *label)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { entries })
    }

    pub fn first(&self, text: &str) -> Option<T> {
        self.entries
            .iter()
            .find(|(set, _)| set.matches(text))
            .map(|(_, label)| *label)
    }

    pub fn any(&self, text: &str) -> bool {
        self.entries.iter().any(|(set, _)| set.matches(text))
    }
}

#[derive(Debug, Clone)]
pub struct Brand {
    pub key: &'static str,
    pub name: &'static str,
    pattern: Regex,
}

const BRANDS: &[(&str, &str)] = &[
    ("SWIGGY", "Swiggy"),
    ("ZOMATO", "Zomato"),
    ("MCDONALD", "McDonalds"),
    ("MCDONALDS", "McDonalds"),
    ("KFC", "KFC"),
    ("BURGER KING", "Burger King"),
    ("BURGERKING", "Burger King"),
    ("INSTAMART", "Instamart"),
    ("BARBEQUE NATION", "Barbeque Nation"),
    ("BARBEQUE", "Barbeque Nation"),
    ("MONCHUNIES", "Monchunies"),
    ("DOMINOS", "Dominos Pizza"),
    ("DOMINO", "Dominos Pizza"),
    ("PIZZA HUT", "Pizza Hut"),
    ("PIZZA", "Pizza"),
    ("SUBWAY", "Subway"),
    ("HALDIRAM", "Haldiram"),
    ("HALDIRAMS", "Haldiram"),
    ("SPENCERS", "Spencer's"),
    ("SPENCER'S", "Spencer's"),
    ("SPENCER", "Spencer's"),
    ("SPENCERS RETAIL", "Spencer's"),
    ("DMART", "DMart"),
    ("D'MART", "DMart"),
    ("BIG BAZAAR", "Big Bazaar"),
    ("BIGBAZAAR", "Big Bazaar"),
    ("RELIANCE SMART", "Reliance Smart"),
    ("RELIANCE", "Reliance"),
    ("NATURE'S BASKET", "Nature's Basket"),
    ("NATURE S BASKET", "Nature's Basket"),
    ("NATURE BASKET", "Nature's Basket"),
    ("BIGBASKET", "BigBasket"),
    ("BIG BASKET", "BigBasket"),
    ("GROFERS", "Grofers"),
    ("AJIO", "AJIO"),
    ("AMAZON", "Amazon"),
    ("FLIPKART", "Flipkart"),
    ("MYNTRA", "Myntra"),
    ("PANTALOONS", "Pantaloons"),
    ("WESTSIDE", "Westside"),
    ("LIFESTYLE", "Lifestyle"),
    ("SHOPPER", "Shoppers Stop"),
    ("PVR", "PVR"),
    ("PVR CINEMAS", "PVR Cinemas"),
    ("CINEPOLIS", "Cinepolis"),
    ("INOX", "INOX"),
    ("BOOKMYSHOW", "BookMyShow"),
    ("CINEMA", "Cinema"),
    ("MOVIE", "Movie"),
    ("OLA", "Ola"),
    ("UBER", "Uber"),
    ("RAPIDO", "Rapido"),
    ("IRCTC", "IRCTC"),
    ("METRO", "Metro"),
    ("REDBUS", "RedBus"),
    ("RED BUS", "RedBus"),
    ("PMPML", "PMPML"),
    ("PMPL", "PMPML"),
    ("MAKE MY TRIP", "MakeMyTrip"),
    ("MAKEMYTRIP", "MakeMyTrip"),
    ("GOIBIBO", "Goibibo"),
    ("GO IBIBO", "Goibibo"),
    ("PRACTO", "Practo"),
    ("GOLD'S GYM", "Gold's Gym"),
    ("GOLDS GYM", "Gold's Gym"),
    ("GYM", "Gym"),
    ("FITNESS", "Fitness"),
    ("CULT FIT", "Cult.fit"),
    ("CULTFIT", "Cult.fit"),
    ("TALWALKARS", "Talwalkars"),
    ("ANYTIME FITNESS", "Anytime Fitness"),
    ("HOSPITAL", "Hospital"),
    ("FORTIS", "Fortis"),
    ("APOLLO", "Apollo"),
    ("PHARMACY", "Pharmacy"),
    ("MEDICAL", "Medical"),
    ("MEDPLUS", "MedPlus"),
    ("MED PLUS", "MedPlus"),
    ("INDIAN OIL", "Indian Oil"),
    ("IOCL", "Indian Oil"),
    ("HP", "HP"),
    ("HPCL", "HPCL"),
    ("BPCL", "Bharat Petroleum"),
    ("BHARAT PETROLEUM", "Bharat Petroleum"),
    ("SHELL", "Shell"),
    ("PETROL PUMP", "Petrol Pump"),
    ("AIRTEL", "Airtel"),
    ("JIO", "Jio"),
    ("VODAFONE", "Vodafone"),
    ("VI", "Vi"),
    ("BSNL", "BSNL"),
    ("FIBER", "Fiber"),
    ("BROADBAND", "Broadband"),
    ("DTH", "DTH"),
    ("ELECTRICITY", "Electricity"),
    ("GAS", "Gas"),
    ("LIC", "LIC"),
    ("HDFC LIFE", "HDFC Life"),
    ("HDFCLIFE", "HDFC Life"),
];

const EMPLOYERS: &[&str] = &[
    "TATA CONSULTANCY SERVICES",
    "TATA CONSULTANCY",
    "TCS",
    "INFOSYS TECHNOLOGIES",
    "INFOSYS",
    "WIPRO TECHNOLOGIES",
    "WIPRO",
    "HCL TECHNOLOGIES",
    "HCL",
    "ACCENTURE",
    "COGNIZANT",
    "CTS",
    "IBM INDIA",
    "IBM",
    "MICROSOFT INDIA",
    "MICROSOFT",
    "GOOGLE INDIA",
    "GOOGLE",
    "AMAZON INDIA",
    "AMAZON",
    "FLIPKART",
    "PAYTM PAYMENTS",
    "PAYTM",
    "ZOMATO",
    "SWIGGY",
    "OYO ROOMS",
    "OYO",
    "OLA CABS",
    "OLA",
    "UBER INDIA",
    "UBER",
    "RELIANCE INDUSTRIES",
    "RELIANCE",
    "TATA GROUP",
    "TATA",
    "MAHINDRA & MAHINDRA",
    "MAHINDRA",
    "BAJAJ AUTO",
    "BAJAJ",
    "MARUTI SUZUKI",
    "MARUTI",
    "HDFC BANK",
    "HDFC",
    "ICICI BANK",
    "ICICI",
    "AXIS BANK",
    "AXIS",
    "STATE BANK OF INDIA",
    "SBI",
    "KOTAK MAHINDRA BANK",
    "KOTAK",
    "YES BANK",
    "INDUSIND BANK",
    "INDUSIND",
];

/// Brand fragments with a definite category, checked against merchant names
const BRAND_CATEGORIES: &[(&[&str], Category)] = &[
    (
        &["SWIGGY", "ZOMATO", "MCDONALD", "MCDONALDS", "KFC", "DOMINOS", "PIZZA HUT", "SUBWAY", "HALDIRAM"],
        Category::FoodDining,
    ),
    (
        &[
            "DMART",
            "BIG BAZAAR",
            "BIGBAZAAR",
            "SPENCERS",
            "SPENCER'S",
            "SPENCER",
            "RELIANCE",
            "BIGBASKET",
            "GROFERS",
        ],
        Category::Groceries,
    ),
    (
        &["PVR", "CINEPOLIS", "BOOKMYSHOW", "INOX", "CINEMA", "MOVIE"],
        Category::Entertainment,
    ),
    (
        &["AJIO", "AMAZON", "FLIPKART", "MYNTRA", "PANTALOONS", "WESTSIDE", "LIFESTYLE"],
        Category::Shopping,
    ),
    (&["LIC", "HDFC LIFE", "HDFCLIFE"], Category::Insurance),
];

/// Every table the suggestion, ladder, safety pass and advisory validation read
#[derive(Debug, Clone)]
pub struct RuleTables {
    /// Longest key first
    brands: Vec<Brand>,
    employers: Vec<(&'static str, Regex)>,
    pub merchant: MerchantPatterns,
    /// Brands that keep a `CR/<name>` segment from reading as a person
    pub person_blockers: KeywordSet,

    pub rails: LabeledSet<Channel>,
    pub loans: LabeledSet<Option<&'static str>>,
    pub education: LabeledSet<Option<&'static str>>,
    pub education_final: LabeledSet<&'static str>,
    pub travel_booking: LabeledSet<&'static str>,
    pub atm: KeywordSet,
    pub atm_cash: KeywordSet,
    /// Bank codes that already mean "withdrawn at an ATM"
    pub atm_withdrawal_codes: KeywordSet,
    pub cash_deposit: KeywordSet,
    pub utility_payment: KeywordSet,
    pub fuel: KeywordSet,
    pub petrol: KeywordSet,
    pub gas: KeywordSet,
    pub fuel_words: KeywordSet,
    pub utilities: LabeledSet<Option<&'static str>>,
    pub telecom: LabeledSet<&'static str>,
    pub telecom_service: KeywordSet,
    pub home_connection: KeywordSet,
    pub groceries: KeywordSet,
    pub food: KeywordSet,
    pub entertainment: KeywordSet,
    pub shopping: KeywordSet,
    pub ajio: KeywordSet,
    pub travel: KeywordSet,
    pub toll: KeywordSet,
    pub healthcare: KeywordSet,
    pub rent: KeywordSet,
    pub insurance: LabeledSet<Option<&'static str>>,
    pub salary: KeywordSet,
    pub person_rails: KeywordSet,
    pub transfer_rails: KeywordSet,
    pub interest: KeywordSet,
    pub billdk: KeywordSet,
    pub cards: KeywordSet,
    pub card_payment: KeywordSet,
    pub ach_debit: KeywordSet,
    pub lender: KeywordSet,
    pub transfer_words: KeywordSet,
    pub medr: KeywordSet,
    pub card_banks: Regex,
    pub insurer: Regex,
    pub employer_prefix: Regex,
    pub employer_noise: Regex,
    /// Expectations an advisory answer must agree with
    pub advisory_checks: Vec<(KeywordSet, Category)>,
    pub advisory_cash: KeywordSet,
    brand_categories: LabeledSet<Category>,
}

impl RuleTables {
    pub fn new() -> Result<Self, regex::Error> {
        let mut brands = BRANDS
            .iter()
            .map(|&(key, name)| {
                Ok(Brand {
                    key,
                    name,
                    pattern: Regex::new(&format!(r"\b{}\b", phrase_pattern(key)))?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        brands.sort_by(|a, b| b.key.len().cmp(&a.key.len()));

        let employers = EMPLOYERS
            .iter()
            .map(|e| Ok((*e, Regex::new(&format!(r"\b{}\b", phrase_pattern(e)))?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            brands,
            employers,
            merchant: MerchantPatterns::new()?,
            person_blockers: KeywordSet::new(&[
                "SWIGGY",
                "ZOMATO",
                "AMAZON",
                "FLIPKART",
                "DMART",
                "RELIANCE",
                "AIRTEL",
                "JIO",
                "LIC",
                "HDFC",
                "PVR",
                "BOOKMYSHOW",
                "DOMINOS",
            ])?,
            rails: LabeledSet::new(&[
                (&["CWDR"], Channel::Cash),
                (&["BUPI"], Channel::Upi),
                (&["MEDR"], Channel::Card),
                (&["NACH"], Channel::Ach),
                (&["UPIAB", "UPIAR"], Channel::Upi),
                (&["MOBFT"], Channel::Upi),
                (&["UPI"], Channel::Upi),
                (&["IMPS"], Channel::Imps),
                (&["NEFT"], Channel::Neft),
                (&["RTGS"], Channel::Rtgs),
                (&["ATM"], Channel::Atm),
            ])?,
            loans: LabeledSet::new(&[
                (
                    &["HOME LOAN", "HOUSING LOAN", "HOME LOAN EMI", "HOUSING LOAN EMI"],
                    Some("Home Loan EMI"),
                ),
                (&["PERSONAL LOAN", "PERSONAL LOAN EMI"], Some("Personal Loan EMI")),
                (&["CAR LOAN", "CAR LOAN EMI"], Some("Car Loan EMI")),
                (&["EDUCATION LOAN", "EDUCATION LOAN EMI"], Some("Education Loan EMI")),
                (&["CREDIT CARD EMI"], Some("Credit Card EMI")),
                (&["LOAN EMI"], Some("Loan EMI Payment")),
                (&["HOMECRINDFIN", "HOME CREDIT"], Some("Home Credit EMI")),
                (&["ACH D-", "NBFC", "FINANCE"], None),
                (&["EMI"], Some("EMI Payment")),
            ])?,
            education: LabeledSet::new(&[
                (&["SCHOOL FEES", "SCHOOLFEES"], Some("School Fees")),
                (&["SCHOOL"], Some("School")),
                (&["COLLEGE"], Some("College")),
                (&["UNIVERSITY"], Some("University")),
                (&["TUITION"], Some("Tuition")),
                (&["ADMISSION"], Some("Admission")),
                (&["FEES"], Some("Fees")),
                (&["EDUCATION"], None),
            ])?,
            education_final: LabeledSet::new(&[
                (&["SCHOOL FEES", "SCHOOLFEES"], "School Fees"),
                (&["EDUCATION FEE", "EDUCATION FEES"], "Education Fee"),
                (&["TUITION FEE", "TUITION FEES"], "Tuition Fee"),
                (&["ANNUAL FEE", "ANNUAL FEES"], "School Fees"),
                (&["SCHOOL ADMISSION"], "School Admission"),
                (&["SCHOOL"], "School"),
                (&["COLLEGE"], "College"),
                (&["UNIVERSITY"], "University"),
                (&["TUITION"], "Tuition"),
                (&["ADMISSION"], "Admission"),
            ])?,
            travel_booking: LabeledSet::new(&[
                (&["IRCTC"], "IRCTC"),
                (&["YATRA"], "Yatra"),
                (&["CLEARTRIP"], "Cleartrip"),
                (&["MAKE MY TRIP", "MAKEMYTRIP"], "MakeMyTrip"),
                (&["FLIGHT"], "Flight Booking"),
                (&["HOTEL"], "Hotel Booking"),
            ])?,
            atm: KeywordSet::new(&["ATM", "ATW"])?,
            atm_cash: KeywordSet::new(&["CASH", "WDL", "WITHDRAWAL"])?,
            atm_withdrawal_codes: KeywordSet::new(&["ATW"])?,
            cash_deposit: KeywordSet::new(&["CASH DEP", "CASH DEPOSIT"])?,
            utility_payment: KeywordSet::new(&[
                "GAS PAYMENT",
                "GAS BILL",
                "LPG",
                "ELECTRICITY",
                "POWER",
                "DISCOM",
                "MSEDCL",
                "MSEB",
                "BESCOM",
                "TANGEDCO",
            ])?,
            fuel: KeywordSet::new(&[
                "PETROL PUMP",
                "IOCL",
                "BPCL",
                "HPCL",
                "INDIAN OIL",
                "BHARAT PETROLEUM",
                "HP",
                "SHELL",
                "DIESEL",
            ])?,
            petrol: KeywordSet::new(&["PETROL", "FUEL"])?,
            gas: KeywordSet::new(&["GAS"])?,
            fuel_words: KeywordSet::new(&["PETROL", "FUEL", "BPCL", "HPCL", "IOCL"])?,
            utilities: LabeledSet::new(&[
                (&["MSEDCL"], Some("MSEDCL")),
                (&["MSEB"], Some("MSEB")),
                (&["BESCOM"], Some("BESCOM")),
                (&["TANGEDCO"], Some("TANGEDCO")),
                (&["DISCOM"], Some("DISCOM")),
                (&["ELECTRICITY", "POWER"], Some("Electricity")),
                (&["GAS PAYMENT", "GAS BILL", "LPG"], Some("Gas")),
                (&["INTERNET"], Some("Internet Service")),
                (&["FIBER", "BROADBAND", "DTH"], None),
            ])?,
            telecom: LabeledSet::new(&[
                (&["JIO"], "Jio"),
                (&["AIRTEL"], "Airtel"),
                (&["VODAFONE"], "Vodafone"),
                (&["VI"], "Vi"),
                (&["BSNL"], "BSNL"),
            ])?,
            telecom_service: KeywordSet::new(&["RECHARGE", "BILL", "FIBER", "BROADBAND", "DTH"])?,
            home_connection: KeywordSet::new(&["DTH", "FIBER", "BROADBAND"])?,
            groceries: KeywordSet::new(&[
                "SPENCERS",
                "SPENCER'S",
                "SPENCER",
                "DMART",
                "D'MART",
                "BIG BAZAAR",
                "BIGBAZAAR",
                "RELIANCE SMART",
                "RELIANCE",
                "NATURE'S BASKET",
                "NATURE S BASKET",
                "BIGBASKET",
                "BIG BASKET",
                "GROFERS",
            ])?,
            food: KeywordSet::new(&[
                "SWIGGY",
                "ZOMATO",
                "MCDONALD",
                "MCDONALDS",
                "KFC",
                "BURGER KING",
                "BURGERKING",
                "INSTAMART",
                "BARBEQUE NATION",
                "BARBEQUE",
                "MONCHUNIES",
                "DOMINOS",
                "DOMINO",
                "PIZZA HUT",
                "PIZZA",
                "SUBWAY",
                "HALDIRAM",
                "HALDIRAMS",
            ])?,
            entertainment: KeywordSet::new(&[
                "PVR",
                "PVR CINEMAS",
                "CINEPOLIS",
                "BOOKMYSHOW",
                "BOOK MY SHOW",
                "INOX",
                "CINEMA",
                "MOVIE",
            ])?,
            shopping: KeywordSet::new(&[
                "AJIO",
                "AMAZON",
                "FLIPKART",
                "MYNTRA",
                "DMART",
                "D'MART",
                "BIG BAZAAR",
                "BIGBAZAAR",
                "PANTALOONS",
                "WESTSIDE",
                "LIFESTYLE",
                "SHOPPER",
            ])?,
            ajio: KeywordSet::new(&["AJIO"])?,
            travel: KeywordSet::new(&[
                "OLA",
                "UBER",
                "RAPIDO",
                "IRCTC",
                "GOIBIBO",
                "GO IBIBO",
                "METRO",
                "REDBUS",
                "RED BUS",
                "PMPML",
                "PMPL",
                "MAKE MY TRIP",
                "MAKEMYTRIP",
                "FASTAG",
                "TOLL",
            ])?,
            toll: KeywordSet::new(&["FASTAG", "TOLL"])?,
            healthcare: KeywordSet::new(&[
                "PRACTO",
                "GYM",
                "FITNESS",
                "GOLD'S GYM",
                "GOLDS GYM",
                "CULT FIT",
                "CULTFIT",
                "TALWALKARS",
                "ANYTIME FITNESS",
                "HOSPITAL",
                "FORTIS",
                "APOLLO",
                "PHARMACY",
                "MEDICAL",
                "MEDPLUS",
                "MED PLUS",
            ])?,
            rent: KeywordSet::new(&["RENT", "HOUSE RENT", "RENTAL", "RENT PAYMENT"])?,
            insurance: LabeledSet::new(&[
                (&["LIC"], Some("LIC")),
                (&["HDFC LIFE", "HDFCLIFE"], Some("HDFC Life")),
                (
                    &["INSURANCE", "LIFE INSURANCE", "HEALTH INSURANCE", "TERM INSURANCE"],
                    None,
                ),
                (&["PREMIUM", "POLICY"], None),
            ])?,
            salary: KeywordSet::new(&["SALARY", "PAYROLL"])?,
            person_rails: KeywordSet::new(&["UPIAB", "UPIAR", "MOBFT", "IMPS", "NEFT"])?,
            transfer_rails: KeywordSet::new(&[
                "UPIAB", "UPIAR", "MOBFT", "IMPS", "NEFT", "RTGS", "UPI CR",
            ])?,
            interest: KeywordSet::new(&[
                "CREDIT INTEREST",
                "INTEREST CREDIT",
                "INTEREST INCOME",
                "INTEREST PAID",
                "INTEREST ON SAVINGS",
                "SAVINGS INTEREST",
            ])?,
            billdk: KeywordSet::new(&["BILLDK"])?,
            cards: KeywordSet::new(&["CARDS"])?,
            card_payment: KeywordSet::new(&[
                "SBI CARDS",
                "CARD PAYMENT",
                "CARD SETTLEMENT",
                "CARD BILL",
                "CREDIT CARD",
                "CARD DUES",
                "CARD OUTSTANDING",
                "CARD STATEMENT",
                "CARD MINIMUM",
                "CARD AMOUNT",
                "CARDS PAYMENT",
                "CC PAYMENT",
                "CARD REPAYMENT",
            ])?,
            ach_debit: KeywordSet::new(&["ACH D", "ACH-D"])?,
            lender: KeywordSet::new(&[
                "FINANCE",
                "NBFC",
                "LOAN",
                "EMI",
                "HOMECREDIT",
                "HOME CREDIT",
                "HOME",
                "INDFIN",
                "IND FIN",
                "INDIAFIN",
                "HOMECRINDFIN",
                "HDFC BANK",
                "ICICI BANK",
                "AXIS BANK",
                "KOTAK",
                "FULLERTON",
                "CAPITAL FIRST",
                "IDFC",
                "ADITYA BIRLA",
            ])?,
            transfer_words: KeywordSet::new(&["NEFT", "IMPS", "RTGS", "BANK TRANSFER", "UPI P2P"])?,
            medr: KeywordSet::new(&["MEDR"])?,
            card_banks: Regex::new(r"\b(SBI|HDFC|AXIS|ICICI|KOTAK|PNB|BOI|UNION|CENTRAL)\b")?,
            insurer: Regex::new(r"\b([A-Z]+)\s+(?:(?:LIFE|HEALTH|TERM)\s+)?INSURANCE\b")?,
            employer_prefix: Regex::new(r"([A-Z][A-Z\s&]+?)\s+SALARY")?,
            employer_noise: Regex::new(
                r"\b(?:FROM|FOR|MONTH|PAYMENT|CREDIT|DEBIT|NEFT|IMPS|RTGS|UPI|CR|DR)\b",
            )?,
            advisory_checks: vec![
                (
                    KeywordSet::new(&[
                        "SWIGGY",
                        "ZOMATO",
                        "MCDONALD",
                        "KFC",
                        "BURGER KING",
                        "INSTAMART",
                        "BARBEQUE NATION",
                        "MONCHUNIES",
                        "DOMINOS",
                        "SUBWAY",
                    ])?,
                    Category::FoodDining,
                ),
                (
                    KeywordSet::new(&[
                        "DMART",
                        "BIG BAZAAR",
                        "RELIANCE SMART",
                        "SPENCERS",
                        "SPENCER'S",
                        "BIGBASKET",
                        "GROFERS",
                        "NATURE'S BASKET",
                        "NATURE S BASKET",
                    ])?,
                    Category::Groceries,
                ),
                (
                    KeywordSet::new(&["CINEMA", "MOVIE", "PVR", "INOX", "BOOKMYSHOW", "CINEPOLIS"])?,
                    Category::Entertainment,
                ),
                (
                    KeywordSet::new(&[
                        "OLA",
                        "UBER",
                        "RAPIDO",
                        "IRCTC",
                        "METRO",
                        "REDBUS",
                        "PMPML",
                        "MAKE MY TRIP",
                        "GOIBIBO",
                    ])?,
                    Category::Travel,
                ),
                (
                    KeywordSet::new(&[
                        "PRACTO",
                        "GYM",
                        "FITNESS",
                        "GOLD'S GYM",
                        "CULT FIT",
                        "TALWALKARS",
                        "ANYTIME FITNESS",
                        "HOSPITAL",
                        "FORTIS",
                        "APOLLO",
                    ])?,
                    Category::Healthcare,
                ),
                (
                    KeywordSet::new(&[
                        "AIRTEL",
                        "JIO",
                        "VI",
                        "VODAFONE",
                        "BSNL",
                        "FIBER",
                        "BROADBAND",
                        "DTH",
                        "ELECTRICITY",
                        "GAS",
                    ])?,
                    Category::BillsUtilities,
                ),
                (
                    KeywordSet::new(&[
                        "INDIAN OIL",
                        "IOCL",
                        "HP",
                        "HPCL",
                        "BPCL",
                        "BHARAT PETROLEUM",
                        "PETROL PUMP",
                        "SHELL",
                    ])?,
                    Category::Fuel,
                ),
                (
                    KeywordSet::new(&["NEFT", "IMPS", "RTGS", "BANK TRANSFER", "UPI P2P"])?,
                    Category::Transfer,
                ),
            ],
            advisory_cash: KeywordSet::new(&[
                "ATM",
                "ATM WDL",
                "ATM CASH",
                "CASH WDL",
                "CASH WITHDRAWAL",
            ])?,
            brand_categories: LabeledSet::new(BRAND_CATEGORIES)?,
        })
    }

    /// Compile once and hand out a shared handle
    pub fn shared() -> Result<Arc<Self>, regex::Error> {
        Ok(Arc::new(Self::new()?))
    }

    /// First brand (longest key first) that appears as a whole word
    pub fn brand_in(&self, text: &str) -> Option<&Brand> {
        self.brands.iter().find(|b| b.pattern.is_match(text))
    }

    /// Whether a display name or narration segment is a known brand
    pub fn names_brand(&self, name: &str) -> bool {
        self.brand_in(&name.to_uppercase()).is_some()
    }

    pub fn employer_in(&self, text: &str) -> Option<&'static str> {
        self.employers
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(name, _)| *name)
    }

    /// Category implied by a brand fragment inside a merchant name
    pub fn brand_category(&self, merchant: &str) -> Option<Category> {
        self.brand_categories.first(&merchant.to_uppercase())
    }

    /// ATM rail, including the `ATW-` prefix some banks print
    pub fn is_atm(&self, text: &str) -> bool {
        self.atm.matches(text) || text.contains("ATW-")
    }

    /// Cash taken out at an ATM: the rail plus a cash word or an ATW code
    pub fn is_atm_cash(&self, text: &str) -> bool {
        self.is_atm(text) && (self.atm_cash.matches(text) || self.atm_withdrawal_codes.matches(text))
    }

    /// Telecom brand present together with a service word
    pub fn telecom_with_service(&self, text: &str) -> Option<&'static str> {
        let brand = self.telecom.first(text)?;
        self.telecom_service.matches(text).then_some(brand)
    }

    pub fn has_utility(&self, text: &str) -> bool {
        self.utilities.any(text) || self.utility_payment.matches(text) || self.telecom_with_service(text).is_some()
    }
}

/// Title-case the way narration names are displayed: a letter following a
/// non-letter is upper-cased, every other letter lower-cased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
