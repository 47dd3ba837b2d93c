use std::path::Path;

use dicom::core::value::DataSetSequence;
use dicom::core::{DataElement, PrimitiveValue, VR, dicom_value};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::tags;
use dicom_viewport::enums::{Directionality, PhotometricInterpretation, TextAttribute};
use dicom_viewport::intensity::ModalityLut;
use dicom_viewport::{Dataset, DatasetError, DicomDataset, Lookup, WindowRequest, extract_diffusion, render_frame};

fn element(tag: dicom::core::Tag, vr: VR, value: PrimitiveValue) -> DataElement<InMemDicomObject> {
    DataElement::new(tag, vr, value)
}

fn sequence(tag: dicom::core::Tag, items: Vec<InMemDicomObject>) -> DataElement<InMemDicomObject> {
    DataElement::new(tag, VR::SQ, DataSetSequence::from(items))
}

fn diffusion_item(b_value: f64, directionality: &str, gradient: Option<[f64; 3]>) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    item.put(element(tags::DIFFUSION_B_VALUE, VR::FD, PrimitiveValue::from(b_value)));
    item.put(element(
        tags::DIFFUSION_DIRECTIONALITY,
        VR::CS,
        PrimitiveValue::from(directionality),
    ));
    if let Some([x, y, z]) = gradient {
        let mut orientation = InMemDicomObject::new_empty();
        orientation.put(element(
            tags::DIFFUSION_GRADIENT_ORIENTATION,
            VR::FD,
            dicom_value!(F64, [x, y, z]),
        ));
        item.put(sequence(tags::DIFFUSION_GRADIENT_DIRECTION_SEQUENCE, vec![orientation]));
    }
    item
}

fn functional_group(diffusion: InMemDicomObject) -> InMemDicomObject {
    let mut group = InMemDicomObject::new_empty();
    group.put(sequence(tags::MR_DIFFUSION_SEQUENCE, vec![diffusion]));
    group
}

/// Two-frame 2x3 MR instance with rescale, window and diffusion groups.
fn write_instance(path: &Path) {
    let mut obj = InMemDicomObject::new_empty();
    obj.put(element(tags::MODALITY, VR::CS, PrimitiveValue::from("MR")));
    obj.put(element(tags::SERIES_DESCRIPTION, VR::LO, PrimitiveValue::from("ep2d_diff ")));
    obj.put(element(tags::ROWS, VR::US, PrimitiveValue::from(2_u16)));
    obj.put(element(tags::COLUMNS, VR::US, PrimitiveValue::from(3_u16)));
    obj.put(element(tags::NUMBER_OF_FRAMES, VR::IS, PrimitiveValue::from("2")));
    obj.put(element(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)));
    obj.put(element(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        PrimitiveValue::from("MONOCHROME2"),
    ));
    obj.put(element(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)));
    obj.put(element(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16)));
    obj.put(element(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16)));
    obj.put(element(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(0_u16)));
    obj.put(element(tags::RESCALE_SLOPE, VR::DS, PrimitiveValue::from("2")));
    obj.put(element(tags::RESCALE_INTERCEPT, VR::DS, PrimitiveValue::from("-10")));
    obj.put(element(tags::WINDOW_CENTER, VR::DS, PrimitiveValue::from("20")));
    obj.put(element(tags::WINDOW_WIDTH, VR::DS, PrimitiveValue::from("40")));
    obj.put(sequence(
        tags::PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE,
        vec![
            functional_group(diffusion_item(1000.0, "DIRECTIONAL", Some([0.0, 0.6, 0.8]))),
            InMemDicomObject::new_empty(),
        ],
    ));
    obj.put(sequence(
        tags::SHARED_FUNCTIONAL_GROUPS_SEQUENCE,
        vec![functional_group(diffusion_item(0.0, "ISOTROPIC", None))],
    ));
    obj.put(element(
        tags::PIXEL_DATA,
        VR::OW,
        dicom_value!(U16, [0, 1, 2, 3, 4, 5, 10, 11, 12, 13, 14, 15]),
    ));

    let file = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax("1.2.840.10008.1.2.1")
                .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.4.1")
                .media_storage_sop_instance_uid("2.25.1234567890"),
        )
        .unwrap();
    file.write_to_file(path).unwrap();
}

fn open_instance() -> (tempfile::TempDir, DicomDataset) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("instance.dcm");
    write_instance(&path);
    let dataset = DicomDataset::open(&path).unwrap();
    (dir, dataset)
}

#[test]
fn missing_file_is_a_dicom_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = DicomDataset::open(dir.path().join("absent.dcm"));
    assert!(matches!(result, Err(DatasetError::Dicom(_))));
}

// ----------------------------------------------------------------------------
// Attributes
// ----------------------------------------------------------------------------

#[test]
fn attributes_are_read_as_typed_lookups() {
    let (_dir, dataset) = open_instance();
    assert_eq!(dataset.rows(), Lookup::Value(2));
    assert_eq!(dataset.columns(), Lookup::Value(3));
    assert_eq!(dataset.frame_count(), 2);
    assert_eq!(
        dataset.photometric_interpretation(),
        Lookup::Value(PhotometricInterpretation::Monochrome2)
    );
    assert_eq!(
        dataset.modality_lut(),
        Lookup::Value(ModalityLut::Rescale {
            slope: 2.0,
            intercept: -10.0
        })
    );
    assert_eq!(dataset.window_center(), Lookup::Value(20.0));
    assert_eq!(
        dataset.text(TextAttribute::SeriesDescription),
        Lookup::Value("ep2d_diff".to_string())
    );
    assert_eq!(dataset.text(TextAttribute::StudyDate), Lookup::absent());
}

#[test]
fn pixels_decode_to_stored_values() {
    let (_dir, dataset) = open_instance();
    let pixels = dataset.decode_pixels().unwrap();
    assert_eq!(pixels.number_of_frames(), 2);
    assert_eq!((pixels.rows(), pixels.columns()), (2, 3));
    assert_eq!(pixels.samples()[[1, 1, 2, 0]], 15.0);

    let rendered = render_frame(&dataset, &pixels, 1, WindowRequest::default()).unwrap();
    assert!(rendered.lut_applied);
    assert_eq!(rendered.scalar[[0, 0]], 10.0);
}

// ----------------------------------------------------------------------------
// Diffusion
// ----------------------------------------------------------------------------

#[test]
fn per_frame_diffusion_wins_over_shared() {
    let (_dir, dataset) = open_instance();
    let info = extract_diffusion(&dataset, 0).unwrap();
    assert_eq!(info.b_value, Lookup::Value(1000.0));
    assert_eq!(info.directionality, Lookup::Value(Directionality::Directional));
    assert_eq!(info.gradient_text(), "[0.000, 0.600, 0.800]");
}

#[test]
fn frames_without_their_own_group_use_shared_values() {
    let (_dir, dataset) = open_instance();
    let info = extract_diffusion(&dataset, 1).unwrap();
    assert_eq!(info.b_value, Lookup::Value(0.0));
    assert_eq!(info.directionality, Lookup::Value(Directionality::Isotropic));
    assert_eq!(info.gradient, Lookup::absent());
    assert_eq!(info.gradient_text(), "n/a");
}
