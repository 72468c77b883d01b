//! Fixed BIST symbol universe and the last-resort synthetic dataset.
//!
//! Generated records are plausible but random. They exist so the dashboard
//! always has something to show when neither the remote document nor a
//! durable snapshot is available.

use std::time::Duration;

use crate::{Security, Symbol, UtcDateTime, ValidationError};

/// Every ticker the synthetic generator produces, in display order.
pub const SYMBOLS: &[&str] = &[
    "AEFES", "AKBNK", "ALARK", "ARCLK", "ASELS", "BIMAS", "EKGYO", "EREGL", "FROTO", "GARAN",
    "HALKB", "ISCTR", "KCHOL", "KOZAL", "KOZAA", "KRDMD", "PETKM", "PGSUS", "SAHOL", "SASA",
    "SISE", "SKBNK", "TAVHL", "TCELL", "THYAO", "TKFEN", "TOASO", "TUPRS", "TURSG", "ULKER",
    "VAKBN", "VESTL", "YKBNK", "ZOREN", "ADEL", "ADESE", "AFYON", "AGESA", "AGHOL", "AGROT",
    "AHGAZ", "AKFGY", "AKFYE", "AKGRT", "AKMGY", "AKSA", "AKSEN", "AKSGY", "AKSUE", "AKYHO",
    "ALBRK", "ALCAR", "ALCTL", "ALFAS", "ALGYO", "ALKA", "ALKIM", "ALMAD", "ALTIN", "ALTNY",
    "ANELE", "ANHYT", "ANSGR", "ARASE", "ARSAN", "ARTMS", "ARZUM", "ASLAN", "ASUZU", "ATAGY",
    "ATAKP", "ATATP", "AVHOL", "AVOD", "AVTUR", "AYCES", "AYDEM", "AYEN", "AYGAZ", "AZTEK",
    "BAGFS", "BAHKM", "BAKAB", "BALAT", "BANVT", "BARMA", "BASCM", "BASGZ", "BAYRK", "BEGYO",
    "BERA", "BEYAZ", "BFREN", "BIENY", "BIGCH", "BINHO", "BIOEN", "BIZIM", "BJKAS", "BLCYT",
    "BMEKS", "BMSCH", "BNTAS", "BOBET", "BORLS", "BORSK", "BOSSA", "BRISA", "BRKO", "BRKSN",
    "BRKVY", "BRLSM", "BRMEN", "BRSAN", "BRYAT", "BSOKE", "BTCIM", "BUCIM", "BURCE", "BURVA",
    "BVSAN", "BYDNR", "CANTE", "CARSI", "CCOLA", "CELHA", "CEMAS", "CEMTS", "CEOEM", "CIMSA",
    "CLEBI", "CMBTN", "CMENT", "CONSE", "COSMO", "CRDFA", "CRFSA", "CUSAN", "CVKMD", "CWENE",
    "DAGHL", "DAGI", "DAPGM", "DARDL", "DENGE", "DERHL", "DERIM", "DESA", "DESPC", "DEVA",
    "DGATE", "DGGYO", "DGNMO", "DIRIT", "DITAS", "DMRGD", "DMSAS", "DNISI", "DOAS", "DOBUR",
    "DOCO", "DOFER", "DOGUB", "DOHOL", "DOKTA", "DURDO", "DYOBY", "DZGYO", "EBEBK", "ECILC",
    "ECZYT", "EDATA", "EDIP", "EGEEN", "EGEPO", "EGGUB", "EGPRO", "EGSER", "EKIZ", "ELITE",
    "EMKEL", "EMNIS", "ENERY", "ENJSA", "ENKAI", "ENSRI", "EPLAS", "ERBOS", "ERSU", "ESCAR",
    "ESCOM", "ESEN", "ETILR", "ETYAT", "EUHOL", "EUKYO", "EUPWR", "EUREN", "EUYO", "EYGYO",
    "FADE", "FENER", "FLAP", "FMIZP", "FONET", "FORMT", "FORTE", "FRIGO", "FZLGY", "GARFA",
    "GEDIK", "GEDZA", "GENIL", "GENTS", "GEREL", "GESAN", "GIPTA", "GLBMD", "GLCVY", "GLYHO",
    "GMTAS", "GOKNR", "GOLTS", "GOODY", "GOZDE", "GRNYO", "GRSEL", "GSDDE", "GSDHO", "GSRAY",
    "GUBRF", "GWIND", "GZNMI", "HATEK", "HATSN", "HDFGS", "HEDEF", "HEKTS", "HKTM", "HLGYO",
    "HTTBT", "HUBVC", "HUNER", "HURGZ", "ICBCT", "ICUGS", "IDGYO", "IEYHO", "IHEVA", "IHGZT",
    "IHLAS", "IHLGM", "IHYAY", "IMASM", "INDES", "INFO", "INTEM", "INVEO", "INVES", "IPEKE",
    "ISATR", "ISBIR", "ISBTR", "ISDMR", "ISFIN", "ISGSY", "ISGYO", "ISKPL", "ISKUR", "ISMEN",
    "ISSEN", "ISYAT", "IZENR", "IZMDC", "JANTS", "KAPLM", "KAPOL", "KARTN", "KATMR", "KAYSE",
    "KBORU", "KCAER", "KENT", "KERVN", "KFEIN", "KGYO", "KIMMR", "KLGYO", "KLKIM", "KLMSN",
    "KLNMA", "KLRHO", "KLSER", "KLSYN", "KMPUR", "KNFRT", "KONKA", "KONTR", "KONYA", "KOPOL",
    "KORDS", "KRDMA", "KRDMB", "KRGYO", "KRONT", "KRPLS", "KRSTL", "KRTEK", "KRVGD", "KSTUR",
    "KTLEV", "KTSKR", "KUTPO", "KUVVA", "KUYAS", "KZGYO", "LIDER", "LIDFA", "LINK", "LKMNH",
    "LMKDC", "LOGO", "LUKSK", "MAALT", "MACKO", "MAGEN", "MAKIM", "MAKTK", "MANAS", "MARBL",
    "MARKA", "MARTI", "MAVI", "MEDTR", "MEGAP", "MEKAG", "MEMSA", "MERCN", "MERIT", "MERKO",
    "METRO", "METUR", "MGROS", "MHRGY", "MIATK", "MIGRS", "MIPAZ", "MMCAS", "MNDRS", "MNDTR",
    "MOBTL", "MOGAN", "MPARK", "MRGYO", "MRSHL", "MSGYO", "MTRKS", "MTRYO", "MZHLD", "NATEN",
    "NETAS", "NIBAS", "NTHOL", "NTTUR", "NUHCM", "NUGYO", "OBAMS", "ODAS", "ONCSM", "ORCAY",
    "ORGE", "ORMA", "OSMEN", "OSTIM", "OTKAR", "OTTO", "OYAKC", "OYYAT", "OZBAL", "OZGYO",
    "OZKGY", "OZRDN", "OZSUB", "PAGYO", "PAMEL", "PAPIL", "PARSN", "PASEU", "PATEK", "PCILT",
    "PEKGY", "PENGD", "PENTA", "PETUN", "PINSU", "PKART", "PKENT", "PLTUR", "PNLSN", "PNSUT",
    "POLHO", "POLTK", "PRDGS", "PRKAB", "PRKME", "PRZMA", "PSDTC", "PSGYO", "QNBFB", "QNBFL",
    "QUAGR", "RALYH", "RAYSG", "REEDR", "REYSN", "RGYAS", "RTALB", "RUBNS", "RYGYO", "RYSAS",
    "SAFKR", "SAMAT", "SANEL", "SANFM", "SANKO", "SARKY", "SAYAS", "SDTTR", "SEGYO", "SEKFK",
    "SELEC", "SELGD", "SELVA", "SEYKM", "SILVR", "SKYMD", "SMART", "SMRTG", "SNGYO", "SNKRN",
    "SNPAM", "SODSN", "SOKM", "SONME", "SRVGY", "SUMAS", "SUNTK", "SUWEN", "TABGD", "TARKM",
    "TATGD", "TBORG", "TDGYO", "TEKTU", "TERA", "TETMT", "TEZOL", "TGSAS", "TIRE", "TKNSA",
    "TLMAN", "TMPOL", "TMSN", "TNZTP", "TRCAS", "TRGYO", "TRILC", "TSGYO", "TSKB", "TSPOR",
    "TTKOM", "TTRAK", "TUCLK", "TUKAS", "TUREX", "TURGG", "UFUK", "ULAS", "ULUUN", "UNLU",
    "USAK", "UZERB", "VAKFN", "VANGD", "VBTYZ", "VERTU", "VERUS", "VESBE", "VKGYO", "VKING",
    "VRGYO", "YAPRK", "YATAS", "YAYLA", "YBTAS", "YEOTK", "YESIL", "YGGYO", "YGYO", "YIGIT",
    "YKSLN", "YONGA", "YUNSA", "YYLGD", "ZEDUR", "ZEREN", "ZGYO", "ZINTR", "ZRGYO",
];

/// Sector list cycled by index when generating records.
pub const SECTORS: &[&str] = &[
    "Bankacılık",
    "Holding",
    "Çelik",
    "Otomotiv",
    "Savunma",
    "Perakende",
    "Gayrimenkul",
    "İçecek",
    "Beyaz Eşya",
    "Petrokimya",
    "Havacılık",
    "Kimya",
    "Cam",
    "Turizm",
    "Telekomünikasyon",
    "İnşaat",
    "Petrol",
    "Sigorta",
    "Gıda",
    "Tekstil",
    "Makine",
    "Madencilik",
    "Çimento",
    "Elektronik",
    "Enerji",
    "Kırtasiye",
    "Ambalaj",
    "Eğitim",
    "Teknoloji",
    "Elektrik",
    "Spor",
    "Hizmet",
    "Kağıt",
    "Lojistik",
    "Ticaret",
    "Sanayi",
];

/// Label of the "no sector constraint" choice in sector pickers.
pub const ALL_SECTORS_LABEL: &str = "Tümü";

const COMPANY_NAMES: &[(&str, &str)] = &[
    ("AEFES", "Anadolu Efes Biracılık ve Malt Sanayii A.Ş."),
    ("AKBNK", "Akbank T.A.Ş."),
    ("ALARK", "Alarko Holding A.Ş."),
    ("ARCLK", "Arçelik A.Ş."),
    ("ASELS", "Aselsan Elektronik Sanayi ve Ticaret A.Ş."),
    ("BIMAS", "BİM Birleşik Mağazalar A.Ş."),
    ("EKGYO", "Emlak Konut Gayrimenkul Yatırım Ortaklığı A.Ş."),
    ("EREGL", "Ereğli Demir ve Çelik Fabrikaları T.A.Ş."),
    ("FROTO", "Ford Otomotiv Sanayi A.Ş."),
    ("GARAN", "Türkiye Garanti Bankası A.Ş."),
];

const YEAR: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Display name for a ticker, falling back to `"<SYMBOL> A.Ş."`.
pub fn company_name(symbol: &str) -> String {
    COMPANY_NAMES
        .iter()
        .find(|(known, _)| *known == symbol)
        .map(|(_, name)| (*name).to_owned())
        .unwrap_or_else(|| format!("{symbol} A.Ş."))
}

/// Sector assigned to the record at `index`.
pub fn sector_for_index(index: usize) -> &'static str {
    SECTORS[index % SECTORS.len()]
}

/// Random-draw record generator over [`SYMBOLS`].
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    rng: fastrand::Rng,
}

impl SyntheticGenerator {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Deterministic generator for reproducible output.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// One record per universe symbol, all stamped with `now`.
    pub fn generate(&mut self, now: UtcDateTime) -> Result<Vec<Security>, ValidationError> {
        SYMBOLS
            .iter()
            .enumerate()
            .map(|(index, symbol)| self.generate_one(index, symbol, now))
            .collect()
    }

    fn generate_one(
        &mut self,
        index: usize,
        symbol: &str,
        now: UtcDateTime,
    ) -> Result<Security, ValidationError> {
        let base_price = 10.0 + self.rng.f64() * 500.0;
        let daily_change = (self.rng.f64() - 0.5) * 10.0;
        let book_value = base_price * (0.7 + self.rng.f64() * 0.6);

        let market_cap = (self.rng.f64() * 500_000_000_000.0).floor();
        let price_to_earnings = self
            .draw_present(0.2)
            .then(|| round_to(5.0 + self.rng.f64() * 25.0, 1));
        let float_percent = round_to(20.0 + self.rng.f64() * 60.0, 1);
        let volume = (self.rng.f64() * 50_000_000.0).floor() as u64;

        let all_time_high = round_to(base_price * (1.2 + self.rng.f64() * 0.8), 2);
        let all_time_high_date = now.minus(YEAR.mul_f64(self.rng.f64())).date_string();
        let fifty_two_week_high = round_to(base_price * (1.1 + self.rng.f64() * 0.5), 2);
        let fifty_two_week_low = round_to(base_price * (0.5 + self.rng.f64() * 0.3), 2);
        let dividend_yield = self
            .draw_present(0.3)
            .then(|| round_to(self.rng.f64() * 8.0, 1));

        let mut security = Security::new(
            Symbol::parse(symbol)?,
            company_name(symbol),
            sector_for_index(index),
            round_to(base_price, 2),
            round_to(book_value, 2),
            now,
        )?
        .with_daily_change(
            round_to(daily_change, 2),
            round_to(daily_change / base_price * 100.0, 2),
        )
        .with_market_cap(market_cap)
        .with_volume(volume)
        .with_price_to_earnings(price_to_earnings)
        .with_float_percent(Some(float_percent))
        .with_all_time_high(all_time_high, all_time_high_date)
        .with_fifty_two_week_range(fifty_two_week_low, fifty_two_week_high)
        .with_dividend_yield(dividend_yield);

        // P/B uses the unrounded price.
        security.price_to_book = round_to(base_price / book_value, 2);
        Ok(security)
    }

    /// True with probability `1 - absent_below`.
    fn draw_present(&mut self, absent_below: f64) -> bool {
        self.rng.f64() > absent_below
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
