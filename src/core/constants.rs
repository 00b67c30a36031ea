// Format constants for WFDB records

pub const HEADER_EXTENSION: &str = ".hea";
pub const SAMPLE_EXTENSION: &str = ".dat";
pub const ANNOTATION_EXTENSION: &str = ".ari";

// Special header comment carrying a signal id: "# @pcof <id>"
pub const ID_COMMENT_TAG: &str = "@pcof";

pub const DEFAULT_ADC_GAIN: f64 = 200.0;
pub const DEFAULT_BASELINE: i64 = 0;
// Used when the header leaves the sampling frequency unspecified
pub const DEFAULT_SAMPLING_FREQUENCY: f64 = 250.0;

// Signal description fields from this index onward form the display name
pub const SIGNAL_NAME_FIELD: usize = 8;

// Sample format codes
pub const FORMAT_212: i64 = 212;
pub const FORMAT_16: i64 = 16;

// Format 212: sign threshold and wrap over the 12-bit container
pub const F212_SIGN_THRESHOLD: i32 = 0x800;
pub const F212_WRAP: i32 = 0x1000;

// Annotation escape codes (6-bit code field)
pub const ANN_SKIP: u8 = 59;
pub const ANN_NUM: u8 = 60;
pub const ANN_SUB: u8 = 61;
pub const ANN_CHN: u8 = 62;
pub const ANN_AUX: u8 = 63;

// SKIP payload: 32-bit interval as two 16-bit halves
pub const SKIP_PAYLOAD_SIZE: usize = 4;

/// One entry of the static annotation code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationCode {
    pub symbol: &'static str,
    pub mnemonic: &'static str,
    pub description: &'static str,
    pub beat: bool,
}

const fn code(
    symbol: &'static str,
    mnemonic: &'static str,
    description: &'static str,
    beat: bool,
) -> AnnotationCode {
    AnnotationCode {
        symbol,
        mnemonic,
        description,
        beat,
    }
}

pub const ANNOTATION_CODES: [AnnotationCode; 42] = [
    code("", "NOTQRS", "not-QRS (not a getann/putann code)", false),
    code("N", "NORMAL", "normal beat", true),
    code("L", "LBBB", "left bundle branch block beat", true),
    code("R", "RBBB", "right bundle branch block beat", true),
    code("a", "ABERR", "aberrated atrial premature beat", true),
    code("V", "PVC", "premature ventricular contraction", true),
    code("F", "FUSION", "fusion of ventricular and normal beat", true),
    code("J", "NPC", "nodal (junctional) premature beat", true),
    code("A", "APC", "atrial premature contraction", true),
    code("S", "SVPB", "premature or ectopic supraventricular beat", true),
    code("E", "VESC", "ventricular escape beat", true),
    code("j", "NESC", "nodal (junctional) escape beat", true),
    code("/", "PACE", "paced beat", true),
    code("Q", "UNKNOWN", "unclassifiable beat", true),
    code("~", "NOISE", "signal quality change", false),
    code("", "15", "?", false),
    code("|", "ARFCT", "isolated QRS-like artifact", false),
    code("", "17", "?", false),
    code("s", "STCH", "ST change", false),
    code("T", "TCH", "T-wave change", false),
    code("*", "SYSTOLE", "systole", false),
    code("D", "DIASTOLE", "diastole", false),
    code("\"", "NOTE", "comment annotation", false),
    code("=", "MEASURE", "measurement annotation", false),
    code("p", "PWAVE", "P-wave peak", false),
    code("B", "BBB", "left or right bundle branch block", true),
    code("^", "PACESP", "non-conducted pacer spike", false),
    code("t", "TWAVE", "T-wave peak", false),
    code("+", "RHYTHM", "rhythm change", false),
    code("u", "UWAVE", "U-wave peak", false),
    code("?", "LEARN", "learning", true),
    code("!", "FLWAV", "ventricular flutter wave", false),
    code("[", "VFON", "start of ventricular flutter/fibrillation", false),
    code("]", "VFOFF", "end of ventricular flutter/fibrillation", false),
    code("e", "AESC", "atrial escape beat", true),
    code("n", "SVESC", "supraventricular escape beat", true),
    code("@", "LINK", "link to external data (aux contains URL)", false),
    code("x", "NAPC", "non-conducted P-wave (blocked APB)", false),
    code("f", "PFUS", "fusion of paced and normal beat", true),
    code("`", "WFON/PQ", "WFON / PQ junction (beginning of QRS)", false),
    code("'", "WFOFF/JPT", "WFOFF / J point (end of QRS)", false),
    code("r", "RONT", "R-on-T premature ventricular contraction", true),
];

pub fn annotation_code(code: u8) -> Option<&'static AnnotationCode> {
    ANNOTATION_CODES.get(code as usize)
}
