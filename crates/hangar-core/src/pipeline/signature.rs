//! Content signatures ("magic numbers") by file extension.
//!
//! The table is plain data: extension → list of `(offset, bytes)` pairs. A
//! header matches an extension when any one pair matches. Extensions with no
//! entry are not signature-checked.
//!
//! `cr2`, `nef`, `arw` and `dng` share the generic TIFF header, so any TIFF
//! file is accepted under any of those four names. Telling them apart would
//! need maker-note inspection, which is not done here.

/// Number of header bytes needed to evaluate every entry in the table.
pub const HEADER_LEN: usize = 16;

/// One `(offset, expected bytes)` pair.
pub type Signature = (usize, &'static [u8]);

const JPEG: &[Signature] = &[(0, &[0xFF, 0xD8, 0xFF])];
const PNG: &[Signature] = &[(0, &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])];
const GIF: &[Signature] = &[(0, b"GIF87a"), (0, b"GIF89a")];
const WEBP: &[Signature] = &[(8, b"WEBP")];
const BMP: &[Signature] = &[(0, b"BM")];
const TIFF: &[Signature] = &[(0, &[b'I', b'I', 0x2A, 0x00]), (0, &[b'M', b'M', 0x00, 0x2A])];
const CR3: &[Signature] = &[(4, b"ftyp")];
const RAF: &[Signature] = &[(0, b"FUJIFILMCCD-RAW")];
const ORF: &[Signature] = &[(0, b"IIRO"), (0, b"IIRS"), (0, b"MMOR")];
const RW2: &[Signature] = &[(0, &[b'I', b'I', b'U', 0x00])];

/// Extension → accepted signatures.
pub const SIGNATURES: &[(&str, &[Signature])] = &[
    ("jpg", JPEG),
    ("jpeg", JPEG),
    ("png", PNG),
    ("gif", GIF),
    ("webp", WEBP),
    ("bmp", BMP),
    ("tiff", TIFF),
    ("tif", TIFF),
    ("cr2", TIFF),
    ("nef", TIFF),
    ("arw", TIFF),
    ("dng", TIFF),
    ("cr3", CR3),
    ("raf", RAF),
    ("orf", ORF),
    ("rw2", RW2),
];

/// Signatures registered for `extension`, if any.
pub fn signatures_for(extension: &str) -> Option<&'static [Signature]> {
    SIGNATURES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, sigs)| *sigs)
}

/// Whether `header` carries one of the signatures listed for `extension`.
///
/// Returns `None` when the extension has no table entry.
pub fn matches(extension: &str, header: &[u8]) -> Option<bool> {
    signatures_for(extension).map(|sigs| sigs.iter().any(|sig| matches_at(header, *sig)))
}

/// First extension from `candidates` whose signature matches `header`.
///
/// Candidates without a table entry never match, so content that cannot be
/// identified is reported as `None`.
pub fn sniff<'a, S: AsRef<str>>(header: &[u8], candidates: &'a [S]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| c.as_ref())
        .find(|ext| matches(ext, header) == Some(true))
}

fn matches_at(header: &[u8], (offset, expected): Signature) -> bool {
    header
        .get(offset..offset + expected.len())
        .is_some_and(|window| window == expected)
}
