//! Filter dispatcher.
//!
//! Turns the positional invocation `<filter_id> <input> [param1] [param2]`
//! into a validated, immutable [`FilterRequest`], then runs the pipeline:
//! decode the input, apply exactly one engine, write the result under the
//! filter's canonical file name.
//!
//! | id | filter        | params          | output       |
//! |----|---------------|-----------------|--------------|
//! | 1  | Median        | `[k]`           | `median.png` |
//! | 2  | Gaussian      | `k sigma`       | `gauss.png`  |
//! | 3  | Edge          | -               | `edges.png`  |
//! | 4  | UniformConv   | `[k]`           | `conv.png`   |
//! | 5  | GrayThreshold | `[threshold]`   | `thresh.png` |
//!
//! Missing optional parameters default to `k = 3` and `threshold = 128`.
//! Every parameter is checked before the input file is opened, and the
//! output directory is checked before any pixel work starts.
//!
//! # Example
//!
//! ```rust,ignore
//! use imgproc_ops::dispatch::{run, EngineOptions, FilterRequest};
//!
//! let request = FilterRequest::from_args("2", "photo.png", &["5", "1.4"])?;
//! let outcome = run(&request, &EngineOptions::default())?;
//! println!("wrote {}", outcome.written[0].display());
//! ```

use crate::convolve::{convolve, sobel_magnitude};
use crate::kernel::{validate_kernel_size, Kernel};
use crate::median::median;
use crate::threshold::{binarize, luminance, validate_threshold};
use crate::{OpsError, OpsResult};
use imgproc_core::RasterImage;
use imgproc_io::IoError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Kernel size used when Median or UniformConv get no parameter.
pub const DEFAULT_KERNEL_SIZE: usize = 3;

/// Threshold used when GrayThreshold gets no parameter.
pub const DEFAULT_THRESHOLD: u8 = 128;

/// File name of the optional luminance intermediate.
pub const GRAY_OUTPUT: &str = "gray.png";

/// The five filters the engine knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Channel-wise median over a `k x k` window.
    Median,
    /// Normalized Gaussian blur.
    Gaussian,
    /// Sobel gradient magnitude.
    Edge,
    /// Box blur, every weight `1/k²`.
    UniformConv,
    /// Luminance followed by binary threshold.
    GrayThreshold,
}

impl FilterKind {
    /// All filters in id order.
    pub const ALL: [FilterKind; 5] = [
        FilterKind::Median,
        FilterKind::Gaussian,
        FilterKind::Edge,
        FilterKind::UniformConv,
        FilterKind::GrayThreshold,
    ];

    /// Looks up a filter by its numeric id (`"1"`..`"5"`).
    pub fn from_id(id: &str) -> OpsResult<Self> {
        let unknown = || {
            OpsError::InvalidArgument(format!("unknown filter id '{}' (expected 1-5)", id))
        };
        let n: u8 = id.trim().parse().map_err(|_| unknown())?;
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == n)
            .ok_or_else(unknown)
    }

    /// Numeric id used on the command line.
    pub fn id(self) -> u8 {
        match self {
            FilterKind::Median => 1,
            FilterKind::Gaussian => 2,
            FilterKind::Edge => 3,
            FilterKind::UniformConv => 4,
            FilterKind::GrayThreshold => 5,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Median => "median",
            FilterKind::Gaussian => "gaussian",
            FilterKind::Edge => "edge",
            FilterKind::UniformConv => "uniform",
            FilterKind::GrayThreshold => "threshold",
        }
    }

    /// Canonical output file name.
    pub fn output_name(self) -> &'static str {
        match self {
            FilterKind::Median => "median.png",
            FilterKind::Gaussian => "gauss.png",
            FilterKind::Edge => "edges.png",
            FilterKind::UniformConv => "conv.png",
            FilterKind::GrayThreshold => "thresh.png",
        }
    }

    /// Positional parameter synopsis, for usage text.
    pub fn synopsis(self) -> &'static str {
        match self {
            FilterKind::Median => "[kernel_size]",
            FilterKind::Gaussian => "<kernel_size> <sigma>",
            FilterKind::Edge => "",
            FilterKind::UniformConv => "[kernel_size]",
            FilterKind::GrayThreshold => "[threshold]",
        }
    }

    /// (required, maximum) number of positional parameters.
    fn arity(self) -> (usize, usize) {
        match self {
            FilterKind::Gaussian => (2, 2),
            // Edge tolerates (and ignores) a stray kernel size.
            FilterKind::Median
            | FilterKind::Edge
            | FilterKind::UniformConv
            | FilterKind::GrayThreshold => (0, 1),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated parameters for one filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterParams {
    /// Median with odd window size.
    Median {
        /// Window side length.
        size: usize,
    },
    /// Gaussian blur.
    Gaussian {
        /// Kernel side length.
        size: usize,
        /// Standard deviation, > 0.
        sigma: f32,
    },
    /// Sobel edges.
    Edge,
    /// Box blur.
    UniformConv {
        /// Kernel side length.
        size: usize,
    },
    /// Grayscale + threshold.
    GrayThreshold {
        /// Luminance cut-off; pixels `>=` it become 255.
        threshold: u8,
    },
}

impl FilterParams {
    /// Parses and validates positional parameters for `kind`.
    ///
    /// # Errors
    ///
    /// - [`OpsError::InvalidArgument`] for a wrong parameter count
    /// - [`OpsError::InvalidParameter`] for the first bad value
    pub fn parse<S: AsRef<str>>(kind: FilterKind, params: &[S]) -> OpsResult<Self> {
        let (required, max) = kind.arity();
        if params.len() < required || params.len() > max {
            let expected = if required == max {
                format!("exactly {}", required)
            } else {
                format!("at most {}", max)
            };
            return Err(OpsError::InvalidArgument(format!(
                "{} filter takes {} parameter(s) {}, got {}",
                kind,
                expected,
                kind.synopsis(),
                params.len()
            )));
        }

        let arg = |i: usize| params.get(i).map(|s| s.as_ref());

        Ok(match kind {
            FilterKind::Median => FilterParams::Median {
                size: kernel_size_or_default(arg(0))?,
            },
            FilterKind::Gaussian => FilterParams::Gaussian {
                size: parse_kernel_size(arg(0).unwrap_or_default())?,
                sigma: parse_sigma(arg(1).unwrap_or_default())?,
            },
            FilterKind::Edge => {
                if let Some(ignored) = arg(0) {
                    debug!(ignored, "edge filter ignores its parameter");
                }
                FilterParams::Edge
            }
            FilterKind::UniformConv => FilterParams::UniformConv {
                size: kernel_size_or_default(arg(0))?,
            },
            FilterKind::GrayThreshold => FilterParams::GrayThreshold {
                threshold: match arg(0) {
                    Some(s) => validate_threshold(parse_int("threshold", s)?)?,
                    None => DEFAULT_THRESHOLD,
                },
            },
        })
    }

    /// Filter these parameters belong to.
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterParams::Median { .. } => FilterKind::Median,
            FilterParams::Gaussian { .. } => FilterKind::Gaussian,
            FilterParams::Edge => FilterKind::Edge,
            FilterParams::UniformConv { .. } => FilterKind::UniformConv,
            FilterParams::GrayThreshold { .. } => FilterKind::GrayThreshold,
        }
    }
}

fn kernel_size_or_default(arg: Option<&str>) -> OpsResult<usize> {
    arg.map_or(Ok(DEFAULT_KERNEL_SIZE), parse_kernel_size)
}

fn parse_kernel_size(s: &str) -> OpsResult<usize> {
    validate_kernel_size(parse_int("kernel_size", s)?)
}

fn parse_int(name: &'static str, s: &str) -> OpsResult<i64> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| OpsError::invalid_parameter(name, format!("'{}' is not an integer", s)))
}

fn parse_sigma(s: &str) -> OpsResult<f32> {
    let sigma: f32 = s
        .trim()
        .parse()
        .map_err(|_| OpsError::invalid_parameter("sigma", format!("'{}' is not a number", s)))?;
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(OpsError::invalid_parameter(
            "sigma",
            format!("must be a positive number, got {}", s),
        ));
    }
    Ok(sigma)
}

/// One filter invocation: input path plus validated parameters.
///
/// Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRequest {
    input: PathBuf,
    params: FilterParams,
}

impl FilterRequest {
    /// Creates a request from already-validated parameters.
    pub fn new(input: impl Into<PathBuf>, params: FilterParams) -> Self {
        Self {
            input: input.into(),
            params,
        }
    }

    /// Builds a request from positional command-line values.
    ///
    /// ```rust
    /// use imgproc_ops::dispatch::{FilterParams, FilterRequest};
    ///
    /// let req = FilterRequest::from_args("5", "in.png", &["200"]).unwrap();
    /// assert_eq!(req.params(), FilterParams::GrayThreshold { threshold: 200 });
    ///
    /// assert!(FilterRequest::from_args("1", "in.png", &["4"]).is_err());
    /// ```
    pub fn from_args<S: AsRef<str>>(
        filter_id: &str,
        input: impl Into<PathBuf>,
        params: &[S],
    ) -> OpsResult<Self> {
        let kind = FilterKind::from_id(filter_id)?;
        let params = FilterParams::parse(kind, params)?;
        Ok(Self::new(input, params))
    }

    /// Input image path.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Validated parameters.
    pub fn params(&self) -> FilterParams {
        self.params
    }

    /// Selected filter.
    pub fn kind(&self) -> FilterKind {
        self.params.kind()
    }
}

/// Engine-wide settings that are not part of a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Directory receiving the output file(s). Must exist.
    pub output_dir: PathBuf,
    /// Also write the luminance intermediate ([`GRAY_OUTPUT`]) for GrayThreshold.
    pub save_gray: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            save_gray: false,
        }
    }
}

/// Result of a successful [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Files written, primary output last.
    pub written: Vec<PathBuf>,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Output channel count.
    pub channels: usize,
}

/// Applies the engine selected by `params` to `image`.
///
/// Filters 1-4 preserve the shape of the input; GrayThreshold returns a
/// single-channel image.
pub fn apply(image: &RasterImage, params: &FilterParams) -> OpsResult<RasterImage> {
    match *params {
        FilterParams::Median { size } => median(image, size),
        FilterParams::Gaussian { size, sigma } => convolve(image, &Kernel::gaussian(size, sigma)?),
        FilterParams::Edge => sobel_magnitude(image),
        FilterParams::UniformConv { size } => convolve(image, &Kernel::box_filter(size)?),
        FilterParams::GrayThreshold { threshold } => binarize(&luminance(image)?, threshold),
    }
}

/// Runs a request end to end: read, filter, write.
///
/// Outputs are committed only after every computation succeeded; on error
/// no output file is created or modified.
pub fn run(request: &FilterRequest, options: &EngineOptions) -> OpsResult<FilterOutcome> {
    let kind = request.kind();
    let out_dir = &options.output_dir;

    if !out_dir.is_dir() {
        return Err(IoError::Write {
            path: out_dir.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "output directory does not exist"),
        }
        .into());
    }

    let image = imgproc_io::read(request.input())?;
    info!(
        filter = %kind,
        input = %request.input().display(),
        width = image.width(),
        height = image.height(),
        channels = image.channels(),
        "applying filter"
    );

    let mut outputs: Vec<(PathBuf, RasterImage)> = Vec::with_capacity(2);
    if options.save_gray && kind == FilterKind::GrayThreshold {
        outputs.push((out_dir.join(GRAY_OUTPUT), luminance(&image)?));
    }
    let result = apply(&image, &request.params())?;
    let (width, height, channels) = (result.width(), result.height(), result.channels());
    outputs.push((out_dir.join(kind.output_name()), result));

    let refs: Vec<(&Path, &RasterImage)> = outputs.iter().map(|(p, img)| (p.as_path(), img)).collect();
    imgproc_io::write_all(&refs)?;

    Ok(FilterOutcome {
        written: outputs.into_iter().map(|(p, _)| p).collect(),
        width,
        height,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn parse(id: &str, params: &[&str]) -> OpsResult<FilterParams> {
        FilterRequest::from_args(id, "in.png", params).map(|r| r.params())
    }

    #[test]
    fn test_ids_and_names() {
        for (i, kind) in FilterKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.id() as usize, i + 1);
            assert_eq!(FilterKind::from_id(&kind.id().to_string()).unwrap(), kind);
        }
        assert_eq!(FilterKind::Gaussian.output_name(), "gauss.png");
        assert_eq!(FilterKind::Edge.output_name(), "edges.png");
        assert_eq!(FilterKind::GrayThreshold.output_name(), "thresh.png");
    }

    #[test]
    fn test_unknown_filter_id() {
        for id in ["0", "6", "x", "", "-1"] {
            let err = FilterKind::from_id(id).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(parse("1", &[]).unwrap(), FilterParams::Median { size: 3 });
        assert_eq!(parse("4", &[]).unwrap(), FilterParams::UniformConv { size: 3 });
        assert_eq!(parse("5", &[]).unwrap(), FilterParams::GrayThreshold { threshold: 128 });
        assert_eq!(parse("3", &[]).unwrap(), FilterParams::Edge);
    }

    #[test]
    fn test_explicit_values() {
        assert_eq!(parse("1", &["5"]).unwrap(), FilterParams::Median { size: 5 });
        assert_eq!(
            parse("2", &["7", "1.5"]).unwrap(),
            FilterParams::Gaussian { size: 7, sigma: 1.5 }
        );
        assert_eq!(parse("4", &[" 1 "]).unwrap(), FilterParams::UniformConv { size: 1 });
        assert_eq!(parse("5", &["0"]).unwrap(), FilterParams::GrayThreshold { threshold: 0 });
        assert_eq!(parse("3", &["9"]).unwrap(), FilterParams::Edge);
    }

    #[test]
    fn test_arity_errors() {
        for (id, params) in [
            ("2", vec![]),
            ("2", vec!["3"]),
            ("2", vec!["3", "1.0", "9"]),
            ("1", vec!["3", "3"]),
            ("3", vec!["3", "3"]),
            ("5", vec!["1", "2"]),
        ] {
            let err = parse(id, &params).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{} {:?}", id, params);
        }
    }

    #[test]
    fn test_parameter_errors_name_the_parameter() {
        let cases = [
            ("1", vec!["4"], "kernel_size"),
            ("2", vec!["4", "1.0"], "kernel_size"),
            ("4", vec!["4"], "kernel_size"),
            ("4", vec!["-3"], "kernel_size"),
            ("1", vec!["abc"], "kernel_size"),
            ("1", vec!["3.0"], "kernel_size"),
            ("2", vec!["3", "0"], "sigma"),
            ("2", vec!["3", "-2"], "sigma"),
            ("2", vec!["3", "nan"], "sigma"),
            ("2", vec!["3", "wide"], "sigma"),
            ("5", vec!["300"], "threshold"),
            ("5", vec!["-1"], "threshold"),
            ("5", vec!["half"], "threshold"),
        ];
        for (id, params, expected) in cases {
            match parse(id, &params) {
                Err(OpsError::InvalidParameter { name, .. }) => assert_eq!(name, expected),
                other => panic!("{} {:?}: unexpected {:?}", id, params, other),
            }
        }
    }

    #[test]
    fn test_apply_shapes() {
        let src = RasterImage::filled(6, 5, 3, 40).unwrap();
        for kind in FilterKind::ALL {
            let params = FilterParams::parse::<&str>(kind, &[]).or_else(|_| {
                FilterParams::parse(kind, &["3", "1.0"])
            });
            let out = apply(&src, &params.unwrap()).unwrap();
            assert_eq!(out.dimensions(), (6, 5));
            let expected = if kind == FilterKind::GrayThreshold { 1 } else { 3 };
            assert_eq!(out.channels(), expected, "{}", kind);
        }
    }

    #[test]
    fn test_request_accessors() {
        let req = FilterRequest::from_args("2", "dir/in.png", &["5", "2"]).unwrap();
        assert_eq!(req.kind(), FilterKind::Gaussian);
        assert_eq!(req.input(), Path::new("dir/in.png"));
    }
}
