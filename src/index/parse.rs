use nom::bytes::complete::take;
use nom::combinator::map_res;
use nom::multi::length_count;
use nom::number::complete::{le_u32, le_u64};
use nom::sequence::Tuple;
use nom::{IResult, Parser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleInfo {
    pub name: String,
    pub uncompressed_size: u32,
}

impl BundleInfo {
    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (name, uncompressed_size)) = (
            map_res(le_u32.flat_map(take), std::str::from_utf8),
            le_u32,
        )
            .parse(input)?;

        Ok((
            input,
            Self {
                name: name.to_owned(),
                uncompressed_size,
            },
        ))
    }

    /// Name of the bundle file relative to the bundle directory.
    pub fn file_name(&self) -> String {
        format!("{}.bundle.bin", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub hash: u64,
    pub bundle_index: u32,
    pub file_offset: u32,
    pub file_size: u32,
}

impl FileInfo {
    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (hash, bundle_index, file_offset, file_size)) =
            (le_u64, le_u32, le_u32, le_u32).parse(input)?;
        Ok((
            input,
            Self {
                hash,
                bundle_index,
                file_offset,
                file_size,
            },
        ))
    }

    /// Byte range of the file inside its decompressed bundle.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.file_offset as usize;
        start..start + self.file_size as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRep {
    pub hash: u64,
    pub payload_offset: u32,
    pub payload_size: u32,
    pub payload_recursive_size: u32,
}

impl PathRep {
    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (hash, payload_offset, payload_size, payload_recursive_size)) =
            (le_u64, le_u32, le_u32, le_u32).parse(input)?;
        Ok((
            input,
            Self {
                hash,
                payload_offset,
                payload_size,
                payload_recursive_size,
            },
        ))
    }
}

/// Tables of the decompressed index bundle.
///
/// The remaining input after the tables is another bundle
/// containing the path representation data.
#[derive(Debug)]
pub struct Tables {
    pub bundles: Vec<BundleInfo>,
    pub files: Vec<FileInfo>,
    pub reps: Vec<PathRep>,
}

impl Tables {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, bundles) = length_count(le_u32, BundleInfo::parse)(input)?;
        let (input, files) = length_count(le_u32, FileInfo::parse)(input)?;
        let (input, reps) = length_count(le_u32, PathRep::parse)(input)?;

        Ok((
            input,
            Self {
                bundles,
                files,
                reps,
            },
        ))
    }
}
