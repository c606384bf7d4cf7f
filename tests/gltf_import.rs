//! Integration tests for glTF import, using a document embedded in the test.

use nalgebra::{Point3, Vector3, Vector4};
use pbr_scene::core::error::{SceneError, VertexChannel};
use pbr_scene::core::geometry::Topology;
use pbr_scene::io::gltf_loader::GltfModel;
use pbr_scene::pipeline::context::{Filter, ValueSpace, WrapMode};
use pbr_scene::pipeline::headless::HeadlessContext;
use pbr_scene::scene::Scene;
use std::path::Path;

/// Quad: 4 positions, 4 normals, 4 texcoords, 6 u16 indices.
const QUAD_BUFFER: &str = "data:application/octet-stream;base64,AACAvwAAgL8AAAAAAACAPwAAgL8AAAAAAACAPwAAgD8AAAAAAACAvwAAgD8AAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAgD8AAIA/AACAPwAAgD8AAAAAAAAAAAAAAAAAAAEAAgAAAAIAAwA=";

/// 2x2 RGBA PNG filled with the flat normal (128, 128, 255).
const FLAT_NORMAL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAIAAAACCAYAAABytg0kAAAAEUlEQVR4nGNoaPj/H4QZYAwAZ9IL+XOQc0UAAAAASUVORK5CYII=";

/// Four tangents `(0, 1, 0, -1)`, one per quad vertex.
const TANGENT_BUFFER: &str = "data:application/octet-stream;base64,AAAAAAAAgD8AAAAAAACAvwAAAAAAAIA/AAAAAAAAgL8AAAAAAACAPwAAAAAAAIC/AAAAAAAAgD8AAAAAAACAvw==";

const ATTRIBUTES: &str = r#""POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2"#;

const BUMPY_MATERIAL: &str = r#"{
    "name": "bumpy",
    "pbrMetallicRoughness": {
      "baseColorFactor": [0.8, 0.8, 0.8, 1.0],
      "metallicFactor": 0.0,
      "roughnessFactor": 0.5
    },
    "normalTexture": { "index": 0, "scale": 0.5 }
  }"#;

fn document(attributes: &str, primitive_extra: &str) -> String {
    document_with_material(attributes, primitive_extra, BUMPY_MATERIAL)
}

fn document_with_material(attributes: &str, primitive_extra: &str, material: &str) -> String {
    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "extensionsUsed": ["KHR_materials_pbrSpecularGlossiness"],
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [
    {{ "name": "root", "translation": [0.0, 1.0, 0.0], "children": [1] }},
    {{ "name": "panel", "mesh": 0, "scale": [2.0, 2.0, 2.0] }}
  ],
  "meshes": [{{
    "name": "panel",
    "primitives": [{{ "attributes": {{ {attributes} }}, "indices": 3, "material": 0{primitive_extra} }}]
  }}],
  "materials": [{material}],
  "textures": [{{ "source": 0, "sampler": 0 }}],
  "samplers": [{{ "magFilter": 9728, "minFilter": 9729, "wrapS": 33071, "wrapT": 33648 }}],
  "images": [{{ "uri": "{png}" }}],
  "buffers": [
    {{ "byteLength": 140, "uri": "{buffer}" }},
    {{ "byteLength": 64, "uri": "{tangents}" }}
  ],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 48, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 48, "byteLength": 48, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 96, "byteLength": 32, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 128, "byteLength": 12, "target": 34963 }},
    {{ "buffer": 1, "byteOffset": 0, "byteLength": 64, "target": 34962 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
       "min": [-1.0, -1.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5126, "count": 4, "type": "VEC3" }},
    {{ "bufferView": 2, "componentType": 5126, "count": 4, "type": "VEC2" }},
    {{ "bufferView": 3, "componentType": 5123, "count": 6, "type": "SCALAR" }},
    {{ "bufferView": 4, "componentType": 5126, "count": 4, "type": "VEC4" }}
  ]
}}"#,
        attributes = attributes,
        primitive_extra = primitive_extra,
        material = material,
        png = FLAT_NORMAL_PNG,
        buffer = QUAD_BUFFER,
        tangents = TANGENT_BUFFER,
    )
}

fn load(scene: &mut Scene, model: &GltfModel) -> pbr_scene::core::error::SceneResult<()> {
    let offset = scene.load_materials_from_gltf(model)?;
    scene.load_scene_from_gltf(model, offset)
}

#[test]
fn embedded_document_imports_and_renders() {
    let model = GltfModel::from_slice(document(ATTRIBUTES, "").as_bytes())
        .expect("embedded document should parse");
    let mut ctx = HeadlessContext::new(256, 256);
    let mut scene = Scene::new("embedded");
    scene.init_with(&mut ctx, |s| load(s, &model)).unwrap();

    // Material and texture mapping
    assert_eq!(scene.materials().len(), 1);
    let material = &scene.materials()[0];
    assert_eq!(material.name, "bumpy");
    assert!(material.has_normal_map());
    assert_eq!(material.normal.normal_scale(), 0.5);
    assert_eq!(material.normal.value_space(), ValueSpace::Linear);
    assert_eq!(material.normal.sampler.mag_filter, Filter::Nearest);
    assert_eq!(material.normal.sampler.min_filter, Filter::Linear);
    assert!(!material.normal.sampler.mipmaps);
    assert_eq!(material.normal.sampler.wrap_u, WrapMode::ClampToEdge);
    assert_eq!(material.normal.sampler.wrap_v, WrapMode::MirroredRepeat);
    let image = material.normal.image().expect("normal image bound");
    assert_eq!(image.dimensions(), (2, 2));
    assert_eq!(image.get_pixel(1, 1).0, [128, 128, 255, 255]);
    let params = material.metal_roughness_params().expect("metal-roughness workflow");
    assert_eq!(params.roughness_factor, 0.5);
    assert_eq!(params.metallic_factor, 0.0);

    // Node hierarchy and geometry
    assert_eq!(scene.root_nodes().len(), 1);
    let root = &scene.root_nodes()[0];
    assert!(root.is_root());
    assert_eq!(root.children().len(), 1);
    let panel = &root.children()[0];
    assert!(!panel.is_root());
    let primitive = &panel.primitives()[0];
    assert_eq!(primitive.vertices().len(), 4);
    assert_eq!(primitive.indices(), &[0, 1, 2, 0, 2, 3]);
    assert_eq!(primitive.topology(), Topology::TriangleList);
    assert_eq!(primitive.material_index(), 0);

    // No tangent accessor: computed because the material is normal mapped
    assert!(primitive.tangent_present());
    for v in primitive.vertices() {
        assert!((v.tangent.xyz() - Vector3::x()).norm() < 1e-5);
    }

    scene.animate_frame(&ctx).unwrap();
    let corner = panel_world_corner(&scene);
    assert!((corner - Point3::new(2.0, 3.0, 0.0)).norm() < 1e-5);

    scene.render_frame(&mut ctx).unwrap();
    assert_eq!(ctx.draws.len(), 1);
    assert!(ctx.draws[0].textures.normal.handle.is_some());
    assert_eq!(ctx.draws[0].object.pbr_params[2], 0.5);

    scene.destroy(&mut ctx);
    assert_eq!(ctx.live_resources(), 0);
}

fn panel_world_corner(scene: &Scene) -> Point3<f32> {
    let panel = &scene.root_nodes()[0].children()[0];
    panel
        .world_matrix()
        .transform_point(&Point3::new(1.0, 1.0, 0.0))
}

#[test]
fn line_primitives_are_rejected() {
    let model = GltfModel::from_slice(document(ATTRIBUTES, r#", "mode": 1"#).as_bytes()).unwrap();
    let mut ctx = HeadlessContext::new(64, 64);
    let mut scene = Scene::new("embedded");
    let err = scene.init_with(&mut ctx, |s| load(s, &model)).unwrap_err();
    assert!(matches!(err, SceneError::UnsupportedTopology { .. }));
    assert!(err.is_import());
    scene.destroy(&mut ctx);
    assert_eq!(ctx.live_resources(), 0);
}

#[test]
fn normal_map_without_texcoords_fails_tangent_generation() {
    let attributes = r#""POSITION": 0, "NORMAL": 1"#;
    let model = GltfModel::from_slice(document(attributes, "").as_bytes()).unwrap();
    let mut ctx = HeadlessContext::new(64, 64);
    let mut scene = Scene::new("embedded");
    let err = scene.init_with(&mut ctx, |s| load(s, &model)).unwrap_err();
    assert!(matches!(
        err,
        SceneError::MissingVertexChannel(VertexChannel::TexCoord)
    ));
    scene.destroy(&mut ctx);
}

#[test]
fn missing_normals_are_generated() {
    let attributes = r#""POSITION": 0, "TEXCOORD_0": 2"#;
    let model = GltfModel::from_slice(document(attributes, "").as_bytes()).unwrap();
    let mut ctx = HeadlessContext::new(64, 64);
    let mut scene = Scene::new("embedded");
    scene.init_with(&mut ctx, |s| load(s, &model)).unwrap();
    let primitive = &scene.root_nodes()[0].children()[0].primitives()[0];
    for v in primitive.vertices() {
        assert!((v.normal - Vector3::z()).norm() < 1e-6);
    }
    scene.destroy(&mut ctx);
}

#[test]
fn imported_tangents_are_kept_as_authored() {
    let attributes = r#""POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2, "TANGENT": 4"#;
    let model = GltfModel::from_slice(document(attributes, "").as_bytes()).unwrap();
    let mut ctx = HeadlessContext::new(64, 64);
    let mut scene = Scene::new("embedded");
    scene.init_with(&mut ctx, |s| load(s, &model)).unwrap();

    let authored = Vector4::new(0.0, 1.0, 0.0, -1.0);
    let primitive = &scene.root_nodes()[0].children()[0].primitives()[0];
    assert!(primitive.tangent_present());
    assert_eq!(primitive.vertices().len(), 4);
    assert!(primitive.vertices().iter().all(|v| v.tangent == authored));

    let before = primitive.vertices().to_vec();
    scene.calculate_missing_tangents().unwrap();
    let after = scene.root_nodes()[0].children()[0].primitives()[0].vertices();
    assert_eq!(after, before.as_slice());
    scene.destroy(&mut ctx);
}

#[test]
fn specular_glossiness_extension_is_imported() {
    let material = r#"{
    "name": "gold",
    "extensions": {
      "KHR_materials_pbrSpecularGlossiness": {
        "diffuseFactor": [0.5, 0.4, 0.3, 1.0],
        "diffuseTexture": { "index": 0 },
        "specularFactor": [1.0, 0.75, 0.25],
        "glossinessFactor": 0.8,
        "specularGlossinessTexture": { "index": 0 }
      }
    }
  }"#;
    let model =
        GltfModel::from_slice(document_with_material(ATTRIBUTES, "", material).as_bytes()).unwrap();
    let mut ctx = HeadlessContext::new(64, 64);
    let mut scene = Scene::new("embedded");
    scene.init_with(&mut ctx, |s| load(s, &model)).unwrap();

    let material = &scene.materials()[0];
    assert!(material.metal_roughness_params().is_none());
    let sg = material
        .specular_glossiness_params()
        .expect("specular-glossiness workflow");
    assert_eq!(sg.diffuse_factor, Vector4::new(0.5, 0.4, 0.3, 1.0));
    assert_eq!(sg.specular_factor, Vector4::new(1.0, 0.75, 0.25, 0.8));
    assert!(sg.diffuse.is_loaded());
    assert!(sg.specular.is_loaded());
    assert_eq!(sg.diffuse.value_space(), ValueSpace::Srgb);
    assert_eq!(sg.specular.value_space(), ValueSpace::Linear);
    assert!(!material.has_normal_map());

    scene.animate_frame(&ctx).unwrap();
    scene.render_frame(&mut ctx).unwrap();
    assert_eq!(ctx.draws[0].object.base_factor, [0.5, 0.4, 0.3, 1.0]);
    assert_eq!(ctx.draws[0].textures.bound_count(), 2);
    scene.destroy(&mut ctx);
    assert_eq!(ctx.live_resources(), 0);
}

#[test]
fn empty_material_falls_back_to_default_factors() {
    let model = GltfModel::from_slice(document_with_material(ATTRIBUTES, "", "{}").as_bytes())
        .unwrap();
    let mut ctx = HeadlessContext::new(64, 64);
    let mut scene = Scene::new("embedded");
    scene.init_with(&mut ctx, |s| load(s, &model)).unwrap();

    let material = &scene.materials()[0];
    assert_eq!(material.name, "material_0");
    assert!(material.specular_glossiness_params().is_none());
    let params = material.metal_roughness_params().expect("metal-roughness fallback");
    assert_eq!(params.base_color_factor, Vector4::repeat(1.0));
    assert_eq!(params.metallic_factor, 1.0);
    assert_eq!(params.roughness_factor, 1.0);
    assert!(!params.base_color.is_loaded());
    assert!(!params.metallic_roughness.is_loaded());
    assert!(!material.has_normal_map());
    // No normal map, so no tangents are generated
    assert!(!scene.root_nodes()[0].children()[0].primitives()[0].tangent_present());
    scene.destroy(&mut ctx);
}

#[test]
fn second_texture_coordinate_set_is_rejected() {
    let material = r#"{
    "name": "bumpy",
    "normalTexture": { "index": 0, "texCoord": 1 }
  }"#;
    let model =
        GltfModel::from_slice(document_with_material(ATTRIBUTES, "", material).as_bytes()).unwrap();
    let mut ctx = HeadlessContext::new(64, 64);
    let mut scene = Scene::new("embedded");
    let err = scene.init_with(&mut ctx, |s| load(s, &model)).unwrap_err();
    assert!(matches!(err, SceneError::Import(_)));
    assert!(err.to_string().contains("coordinate set 1"));
    scene.destroy(&mut ctx);
    assert_eq!(ctx.live_resources(), 0);
}

#[test]
fn missing_file_is_an_import_error() {
    let err = GltfModel::open(Path::new("does/not/exist.gltf")).err().unwrap();
    assert!(err.is_import());
}

#[test]
fn catalog_asset_scene_loads_when_assets_are_present() {
    let root = Path::new("assets");
    if !root.join("DamagedHelmet/glTF/DamagedHelmet.gltf").exists() {
        println!("Skipping test: DamagedHelmet not found under {:?}", root);
        return;
    }
    let mut ctx = HeadlessContext::new(640, 480);
    let mut scene = Scene::new("damaged-helmet").with_asset_root(root);
    scene.init(&mut ctx).expect("failed to load DamagedHelmet");
    assert!(scene.stats().primitives > 0);
    scene.animate_frame(&ctx).unwrap();
    scene.render_frame(&mut ctx).unwrap();
    scene.destroy(&mut ctx);
    assert_eq!(ctx.live_resources(), 0);
}
