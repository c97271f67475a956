//! End-to-end export tests: write a model file to disk and read it back.
//! Run with: cargo test -p smaug-txt --test export_tests

use std::path::PathBuf;

use safetensors::tensor::{serialize_to_file, TensorView};
use safetensors::Dtype;
use smaug_core::{SmaugError, Tensor};
use smaug_nn::{load_model, load_tensor, InspectedLayer, LayerKind, ManifestLayer, Sequential};
use smaug_txt::{export, ExportRequest, SectionValues, TxtModel};

struct TempDir(PathBuf);

impl TempDir {
    fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("smaug-txt-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        TempDir(dir)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn seq(n: usize, scale: f32) -> Vec<f32> {
    (0..n).map(|i| i as f32 * scale).collect()
}

/// conv (3x3x1x4 kernel + bias) → pool → flatten → dense (5x3 kernel + bias).
fn small_cnn() -> Sequential {
    let mut model = Sequential::empty().with_name("cnn");
    model.push(Box::new(ManifestLayer::new(
        "conv",
        "Conv2D",
        vec![
            Tensor::from_f32(&seq(36, 0.25), &[3, 3, 1, 4]),
            Tensor::from_f32(&[0.5; 4], &[4]),
        ],
    )));
    model.push(Box::new(ManifestLayer::new("pool", "MaxPooling2D", vec![])));
    model.push(Box::new(ManifestLayer::new("flatten", "Flatten", vec![])));
    model.push(Box::new(ManifestLayer::new(
        "fc",
        "Dense",
        vec![
            Tensor::from_f32(&seq(15, 1.0), &[5, 3]),
            Tensor::from_f32(&[1.0, 2.0, 3.0], &[3]),
        ],
    )));
    model
}

fn samples() -> (Tensor, Tensor) {
    let inputs = Tensor::from_f32(&seq(2 * 5 * 5, 0.1), &[2, 5, 5, 1]);
    let labels = Tensor::from_f32(&[0.1, 0.7, 0.2, 0.9, 0.05, 0.05], &[2, 3]);
    (inputs, labels)
}

fn request(dir: &TempDir, alignment: usize, transpose: bool) -> ExportRequest {
    let (inputs, labels) = samples();
    ExportRequest::builder()
        .model(&small_cnn())
        .sample_inputs(inputs)
        .sample_labels(labels)
        .model_name("cnn")
        .architecture("SMV")
        .data_alignment(alignment)
        .transpose_weights(transpose)
        .output_dir(&dir.0)
        .build()
        .unwrap()
}

fn floats(values: &SectionValues) -> &[f32] {
    match values {
        SectionValues::Float(v) => v,
        other => panic!("expected float values, got {other:?}"),
    }
}

#[test]
fn test_export_and_read_back() {
    let dir = TempDir::new("roundtrip");
    let summary = export(&request(&dir, 8, false)).unwrap();

    assert_eq!(summary.path, dir.0.join("cnnsmv.txt"));
    assert!(summary.path.exists());
    assert_eq!(summary.num_layers, 4);
    assert_eq!(summary.skipped_layers, 1);
    assert_eq!(summary.depthwise_layers, 0);
    assert_eq!(summary.label, 1);
    assert_eq!(
        summary.bytes_written,
        std::fs::metadata(&summary.path).unwrap().len()
    );

    let model = TxtModel::load(&summary.path).unwrap();
    model.validate().unwrap();
    assert_eq!(model.architecture, "SMV");
    assert_eq!(model.num_layers, 4);
    assert_eq!(model.data_alignment, 8);

    // conv kernel 9 rows * 8, fc kernel 5 rows * 8, fc bias 8
    assert_eq!(model.weights.num_elems, 72 + 40 + 8);
    assert_eq!(summary.weight_elems, model.weights.num_elems);
    // one sample of shape [5, 5, 1]: 25 rows of 1 value padded to 8
    assert_eq!(model.data.num_elems, 25 * 8);
    assert_eq!(model.label(), Some(1));

    let weights = floats(&model.weights.values);
    assert_eq!(&weights[..8], &[0.0, 0.25, 0.5, 0.75, 0.0, 0.0, 0.0, 0.0]);
    // the conv bias (all 0.5) never appears between conv and fc weights
    assert_eq!(&weights[72..80], &[0.0, 1.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_alignment_zero_never_pads() {
    let dir = TempDir::new("unpadded");
    export(&request(&dir, 0, false)).unwrap();
    let model = TxtModel::load(dir.0.join("cnnsmv.txt")).unwrap();
    model.validate().unwrap();

    assert_eq!(model.data_alignment, 0);
    assert_eq!(model.weights.num_elems, 36 + 15 + 3);
    assert_eq!(model.data.num_elems, 25);
    let data = floats(&model.data.values);
    let expected = seq(25, 0.1);
    for (got, want) in data.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-5, "{got} vs {want}");
    }
}

#[test]
fn test_transpose_affects_dense_only() {
    let plain_dir = TempDir::new("plain");
    let transposed_dir = TempDir::new("transposed");
    export(&request(&plain_dir, 0, false)).unwrap();
    export(&request(&transposed_dir, 0, true)).unwrap();

    let plain = TxtModel::load(plain_dir.0.join("cnnsmv.txt")).unwrap();
    let transposed = TxtModel::load(transposed_dir.0.join("cnnsmv.txt")).unwrap();
    let (a, b) = (floats(&plain.weights.values), floats(&transposed.weights.values));
    assert_eq!(a.len(), b.len());

    // conv kernel untouched
    assert_eq!(&a[..36], &b[..36]);
    // fc kernel [5, 3] written column-major
    assert_eq!(&a[36..42], &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(&b[36..42], &[0.0, 3.0, 6.0, 9.0, 12.0, 1.0]);
    // rank-1 bias is the same either way
    assert_eq!(&a[51..], &b[51..]);
    assert_eq!(plain.data, transposed.data);
}

#[test]
fn test_transposed_header_matches_body() {
    let dir = TempDir::new("transposed-padded");
    let summary = export(&request(&dir, 4, true)).unwrap();
    let model = TxtModel::load(&summary.path).unwrap();
    model.validate().unwrap();
    // conv 9 rows * 4, fc kernel transposed to [3, 5]: 3 rows * 8, bias 4
    assert_eq!(model.weights.num_elems, 36 + 24 + 4);
}

#[test]
fn test_depthwise_layers_are_counted() {
    let dir = TempDir::new("depthwise");
    let (inputs, labels) = samples();
    let layers = vec![
        InspectedLayer::new(
            "dw",
            LayerKind::DepthwiseConv2D,
            vec![Tensor::zeros(&[3, 3, 1, 1]), Tensor::zeros(&[1])],
        ),
        InspectedLayer::new("bn", LayerKind::BatchNormalization, vec![Tensor::zeros(&[1])]),
    ];
    let req = ExportRequest::builder()
        .layers(layers)
        .sample_inputs(inputs)
        .sample_labels(labels)
        .model_name("dw")
        .architecture("SMIV")
        .output_dir(&dir.0)
        .build()
        .unwrap();

    let summary = export(&req).unwrap();
    assert_eq!(summary.num_layers, 3);
    assert_eq!(summary.depthwise_layers, 1);
    let model = TxtModel::load(&summary.path).unwrap();
    model.validate().unwrap();
    assert_eq!(model.weights.num_elems, 9 + 1);
}

#[test]
fn test_invalid_request_creates_no_file() {
    let dir = TempDir::new("invalid");
    let err = ExportRequest::builder()
        .model(&small_cnn())
        .sample_inputs(Tensor::from_f32(&[1.0, 2.0], &[2]))
        .sample_labels(Tensor::from_f32(&[1.0, 0.0], &[1, 2]))
        .model_name("cnn")
        .architecture("SMV")
        .output_dir(&dir.0)
        .build()
        .unwrap_err();
    assert!(matches!(err, SmaugError::InvalidSample { what: "input", .. }));
    assert!(!dir.0.join("cnnsmv.txt").exists());
}

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[test]
fn test_export_from_safetensors_files() {
    let dir = TempDir::new("files");
    let manifest = dir.0.join("mlp.json");
    let weights = dir.0.join("mlp.safetensors");
    let samples = dir.0.join("samples.safetensors");

    std::fs::write(
        &manifest,
        r#"{
            "name": "mlp",
            "layers": [
                { "name": "fc1", "class_name": "Dense", "weights": ["fc1/kernel", "fc1/bias"] },
                { "name": "drop", "class_name": "Dropout" },
                { "name": "fc2", "class_name": "Dense", "weights": ["fc2/kernel"] }
            ]
        }"#,
    )
    .unwrap();

    let fc1_kernel = f32_bytes(&seq(6, 1.0));
    let fc1_bias = f32_bytes(&[0.5, -0.5]);
    let fc2_kernel = f32_bytes(&[1.0, 0.0, 0.0, 1.0]);
    serialize_to_file(
        vec![
            ("fc1/kernel", TensorView::new(Dtype::F32, vec![3, 2], &fc1_kernel).unwrap()),
            ("fc1/bias", TensorView::new(Dtype::F32, vec![2], &fc1_bias).unwrap()),
            ("fc2/kernel", TensorView::new(Dtype::F32, vec![2, 2], &fc2_kernel).unwrap()),
        ],
        &None,
        &weights,
    )
    .unwrap();

    let x = f32_bytes(&[0.25, 0.5, 0.75, 1.0, 1.25, 1.5]);
    let y = f32_bytes(&[0.2, 0.3, 0.5, 1.0, 0.0, 0.0]);
    serialize_to_file(
        vec![
            ("x", TensorView::new(Dtype::F32, vec![2, 3], &x).unwrap()),
            ("y", TensorView::new(Dtype::F32, vec![2, 3], &y).unwrap()),
        ],
        &None,
        &samples,
    )
    .unwrap();

    let model = load_model(&manifest, &weights).unwrap();
    let request = ExportRequest::builder()
        .model(&model)
        .sample_inputs(load_tensor(&samples, "x").unwrap())
        .sample_labels(load_tensor(&samples, "y").unwrap())
        .model_name("mlp")
        .architecture("SMIV")
        .data_alignment(4)
        .transpose_weights(true)
        .output_dir(&dir.0)
        .build()
        .unwrap();

    let summary = export(&request).unwrap();
    assert_eq!(summary.path, dir.0.join("mlpsmiv.txt"));
    assert_eq!(summary.num_layers, 3);
    assert_eq!(summary.skipped_layers, 1);
    assert_eq!(summary.label, 2);

    let exported = TxtModel::load(&summary.path).unwrap();
    exported.validate().unwrap();
    // fc1 kernel [3, 2] transposed to [2, 3]: 2 rows * 4, bias 4, fc2 [2, 2]: 2 rows * 4
    assert_eq!(exported.weights.num_elems, 8 + 4 + 8);
    assert_eq!(
        &floats(&exported.weights.values)[..8],
        &[0.0, 2.0, 4.0, 0.0, 1.0, 3.0, 5.0, 0.0]
    );
    assert_eq!(
        floats(&exported.data.values),
        &[0.25, 0.5, 0.75, 0.0]
    );
    assert_eq!(exported.label(), Some(2));
}
