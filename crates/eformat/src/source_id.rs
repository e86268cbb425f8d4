//! Source-identifier: the structured 32-bit `(optional:8 | subdetector:8 | module:16)` id
//! every fragment carries, plus the `SubDetector`/`SubDetectorGroup` lookup tables used to
//! render it in human-readable form.

use std::fmt;

/// The upper nibble of a [`SubDetector`] id groups related detectors together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SubDetectorGroup {
    AnyDetector = 0x0,
    Pixel = 0x1,
    Sct = 0x2,
    Trt = 0x3,
    Lar = 0x4,
    TileCal = 0x5,
    Muon = 0x6,
    Tdaq = 0x7,
    Forward = 0x8,
    OtherDetectors = 0xf,
}

impl SubDetectorGroup {
    /// Derives the group from the low 7 bits of a subdetector id (`id >> 4`).
    pub fn from_subdetector(id: u8) -> Self {
        match (id & 0x7f) >> 4 {
            0x0 => SubDetectorGroup::AnyDetector,
            0x1 => SubDetectorGroup::Pixel,
            0x2 => SubDetectorGroup::Sct,
            0x3 => SubDetectorGroup::Trt,
            0x4 => SubDetectorGroup::Lar,
            0x5 => SubDetectorGroup::TileCal,
            0x6 => SubDetectorGroup::Muon,
            0x7 => SubDetectorGroup::Tdaq,
            0x8 => SubDetectorGroup::Forward,
            _ => SubDetectorGroup::OtherDetectors,
        }
    }

    pub fn human(self) -> &'static str {
        match self {
            SubDetectorGroup::AnyDetector => "ANY_DETECTOR",
            SubDetectorGroup::Pixel => "PIXEL",
            SubDetectorGroup::Sct => "SCT",
            SubDetectorGroup::Trt => "TRT",
            SubDetectorGroup::Lar => "LAR",
            SubDetectorGroup::TileCal => "TILECAL",
            SubDetectorGroup::Muon => "MUON",
            SubDetectorGroup::Tdaq => "TDAQ",
            SubDetectorGroup::Forward => "FORWARD",
            SubDetectorGroup::OtherDetectors => "OTHER_DETECTORS",
        }
    }
}

/// Known sub-detector ids. Not exhaustive of the full ATLAS table, but covers
/// every group and enough representative modules for diagnostics; an
/// unrecognized byte is not an error; it is simply displayed numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SubDetector {
    FullSdEvent = 0x00,
    Offline = 0x01,
    PixelBarrel = 0x11,
    PixelDisk = 0x12,
    PixelBLayer = 0x13,
    PixelIbl = 0x14,
    SctBarrelASide = 0x21,
    SctBarrelCSide = 0x22,
    SctEndcapASide = 0x23,
    SctEndcapCSide = 0x24,
    TrtBarrelASide = 0x31,
    TrtBarrelCSide = 0x32,
    TrtEndcapASide = 0x33,
    TrtEndcapCSide = 0x34,
    LarEmBarrelASide = 0x41,
    LarEmBarrelCSide = 0x42,
    LarEmEndcapASide = 0x43,
    LarEmEndcapCSide = 0x44,
    LarHadEndcapASide = 0x45,
    LarHadEndcapCSide = 0x46,
    LarFcalASide = 0x47,
    LarFcalCSide = 0x48,
    TileCalBarrelASide = 0x51,
    TileCalBarrelCSide = 0x52,
    TileCalExtASide = 0x53,
    TileCalExtCSide = 0x54,
    MuonMdtBarrelASide = 0x61,
    MuonMdtBarrelCSide = 0x62,
    MuonMdtEndcapASide = 0x63,
    MuonMdtEndcapCSide = 0x64,
    MuonRpcBarrelASide = 0x65,
    MuonRpcBarrelCSide = 0x66,
    MuonTgcEndcapASide = 0x67,
    MuonTgcEndcapCSide = 0x68,
    TdaqBeamCrate = 0x70,
    TdaqCaloPreproc = 0x71,
    TdaqCaloClusterProcDaq = 0x72,
    TdaqCaloClusterProcRoi = 0x73,
    TdaqCaloJetProcDaq = 0x74,
    TdaqCaloJetProcRoi = 0x75,
    TdaqMuonCtpInterface = 0x76,
    TdaqCtp = 0x77,
    TdaqL2sv = 0x78,
    TdaqSfi = 0x79,
    TdaqSfo = 0x7a,
    TdaqLvl2 = 0x7b,
    TdaqHlt = 0x7c,
    ForwardBcm = 0x81,
    ForwardLucid = 0x82,
    ForwardZdc = 0x83,
    ForwardAlpha = 0x84,
    ForwardAfp = 0x85,
    Other = 0xff,
}

impl SubDetector {
    pub fn from_u8(v: u8) -> Option<Self> {
        use SubDetector::*;
        Some(match v {
            0x00 => FullSdEvent,
            0x01 => Offline,
            0x11 => PixelBarrel,
            0x12 => PixelDisk,
            0x13 => PixelBLayer,
            0x14 => PixelIbl,
            0x21 => SctBarrelASide,
            0x22 => SctBarrelCSide,
            0x23 => SctEndcapASide,
            0x24 => SctEndcapCSide,
            0x31 => TrtBarrelASide,
            0x32 => TrtBarrelCSide,
            0x33 => TrtEndcapASide,
            0x34 => TrtEndcapCSide,
            0x41 => LarEmBarrelASide,
            0x42 => LarEmBarrelCSide,
            0x43 => LarEmEndcapASide,
            0x44 => LarEmEndcapCSide,
            0x45 => LarHadEndcapASide,
            0x46 => LarHadEndcapCSide,
            0x47 => LarFcalASide,
            0x48 => LarFcalCSide,
            0x51 => TileCalBarrelASide,
            0x52 => TileCalBarrelCSide,
            0x53 => TileCalExtASide,
            0x54 => TileCalExtCSide,
            0x61 => MuonMdtBarrelASide,
            0x62 => MuonMdtBarrelCSide,
            0x63 => MuonMdtEndcapASide,
            0x64 => MuonMdtEndcapCSide,
            0x65 => MuonRpcBarrelASide,
            0x66 => MuonRpcBarrelCSide,
            0x67 => MuonTgcEndcapASide,
            0x68 => MuonTgcEndcapCSide,
            0x70 => TdaqBeamCrate,
            0x71 => TdaqCaloPreproc,
            0x72 => TdaqCaloClusterProcDaq,
            0x73 => TdaqCaloClusterProcRoi,
            0x74 => TdaqCaloJetProcDaq,
            0x75 => TdaqCaloJetProcRoi,
            0x76 => TdaqMuonCtpInterface,
            0x77 => TdaqCtp,
            0x78 => TdaqL2sv,
            0x79 => TdaqSfi,
            0x7a => TdaqSfo,
            0x7b => TdaqLvl2,
            0x7c => TdaqHlt,
            0x81 => ForwardBcm,
            0x82 => ForwardLucid,
            0x83 => ForwardZdc,
            0x84 => ForwardAlpha,
            0x85 => ForwardAfp,
            0xff => Other,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn group(self) -> SubDetectorGroup {
        SubDetectorGroup::from_subdetector(self.code())
    }
}

/// Structured source identifier: `(optional:8 | subdetector:8 | module:16)`.
///
/// Unlike [`SubDetector`], which only names a curated subset of bytes, this
/// type round-trips *every* 32-bit code losslessly: `subdetector_id` holds the
/// raw byte even when it doesn't map to a known [`SubDetector`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceIdentifier {
    subdetector: u8,
    module: u16,
    optional: u8,
}

impl SourceIdentifier {
    pub fn new(subdetector: u8, module: u16, optional: u8) -> Self {
        Self { subdetector, module, optional }
    }

    pub fn from_subdetector(subdet: SubDetector, module: u16) -> Self {
        Self::new(subdet.code(), module, 0)
    }

    pub fn from_code(code: u32) -> Self {
        Self {
            optional: (code >> 24) as u8,
            subdetector: (code >> 16) as u8,
            module: (code & 0xffff) as u16,
        }
    }

    pub fn subdetector_id(self) -> u8 {
        self.subdetector
    }

    pub fn subdetector(self) -> Option<SubDetector> {
        SubDetector::from_u8(self.subdetector)
    }

    pub fn subdetector_group(self) -> SubDetectorGroup {
        SubDetectorGroup::from_subdetector(self.subdetector)
    }

    pub fn optional_field(self) -> u8 {
        self.optional
    }

    pub fn module_id(self) -> u16 {
        self.module
    }

    /// Full 32-bit code assembled from all three fields.
    pub fn code(self) -> u32 {
        ((self.optional as u32) << 24) | ((self.subdetector as u32) << 16) | self.module as u32
    }

    /// Code assembled from only `subdetector` and `module` (optional forced to zero).
    pub fn simple_code(self) -> u32 {
        ((self.subdetector as u32) << 16) | self.module as u32
    }

    pub fn human_detector(self) -> String {
        match self.subdetector() {
            Some(sd) => format!("{:?}", sd),
            None => format!("UNKNOWN(0x{:02x})", self.subdetector),
        }
    }

    pub fn human_group(self) -> &'static str {
        self.subdetector_group().human()
    }

    pub fn human(self) -> String {
        format!("{}/{}/0x{:04x}", self.human_detector(), self.human_group(), self.module)
    }
}

impl fmt::Display for SourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip_all_bytes() {
        for code in [0u32, 1, 0x00410001, 0xffffffff, 0x12345678] {
            assert_eq!(SourceIdentifier::from_code(code).code(), code);
        }
    }

    #[test]
    fn known_subdetector() {
        let sid = SourceIdentifier::from_code(0x0041_0001);
        assert_eq!(sid.subdetector(), Some(SubDetector::LarEmBarrelASide));
        assert_eq!(sid.module_id(), 1);
        assert_eq!(sid.subdetector_group(), SubDetectorGroup::Lar);
    }

    #[test]
    fn group_is_upper_nibble() {
        let sid = SourceIdentifier::new(SubDetector::TdaqCtp.code(), 0, 0);
        assert_eq!(sid.subdetector_group(), SubDetectorGroup::Tdaq);
    }

    #[test]
    fn unknown_subdetector_round_trips_without_error() {
        let sid = SourceIdentifier::from_code(0x00aa_0007);
        assert_eq!(sid.subdetector(), None);
        assert_eq!(sid.code(), 0x00aa_0007);
    }
}
