use phong_ngin::{
    data_structures::{
        light::PointLight,
        material::{Material, PhongMaterial, ShadingModel, UnlitMaterial},
    },
    pipelines::Shader,
    render::{LIGHT_UNIFORM_SIZE, MATERIAL_UNIFORM_SIZE},
};

#[test]
fn phong_material_serialises_to_padded_rows() {
    let material = PhongMaterial::new([0.5, 0.5, 0.9], [0.4, 0.5, 0.2], 8.0);
    assert_eq!(
        material.to_array(),
        [0.5, 0.5, 0.9, 0.0, 0.4, 0.5, 0.2, 0.0, 8.0, 0.0, 0.0, 0.0]
    );
    assert_eq!(bytemuck::bytes_of(&material.to_raw()).len() as u64, MATERIAL_UNIFORM_SIZE);
    assert_eq!(MATERIAL_UNIFORM_SIZE, 48);
}

#[test]
fn point_light_serialises_like_materials() {
    let light = PointLight::new([0.0, 0.0, 5.0], [1.0, 1.0, 1.0], 1.0);
    assert_eq!(
        light.to_array(),
        [0.0, 0.0, 5.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0]
    );
    assert_eq!(LIGHT_UNIFORM_SIZE, 48);
    assert_eq!(PointLight::off().to_array(), [0.0; 12]);
}

#[test]
fn materials_carry_their_shading_model_and_shader() {
    let phong: Material = PhongMaterial::new([1.0, 0.0, 0.0], [1.0, 1.0, 1.0], 32.0).into();
    assert_eq!(phong.shading(), ShadingModel::Phong);
    assert_eq!(phong.shader(), &Shader::phong());
    assert!(phong.as_phong().is_some());

    let flat_shader = Shader::new("Flat Shader", "// flat");
    let unlit: Material = UnlitMaterial::new([0.2, 0.3, 0.4], flat_shader.clone()).into();
    assert_eq!(unlit.shading(), ShadingModel::Unlit);
    assert_eq!(unlit.shading().name(), "unlit");
    assert_eq!(unlit.shader(), &flat_shader);
    assert!(unlit.as_phong().is_none());
    assert_eq!(
        unlit.to_array(),
        [0.2, 0.3, 0.4, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
    );
}

#[test]
fn phong_shader_exposes_fixed_entry_points() {
    let shader = Shader::phong();
    assert!(shader.source().contains("fn vs_main"));
    assert!(shader.source().contains("fn fs_main"));

    let custom = PhongMaterial::new([1.0, 1.0, 1.0], [0.0, 0.0, 0.0], 1.0)
        .with_shader(Shader::new("Custom", "// custom"));
    assert_eq!(custom.shader.label(), "Custom");
}

#[test]
fn unlit_material_serialises_colour_then_zeros() {
    let unlit = UnlitMaterial::new([0.2, 0.3, 0.4], Shader::new("Flat", ""));
    assert_eq!(
        unlit.to_array(),
        [0.2, 0.3, 0.4, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
    );
    let material: Material = unlit.into();
    assert_eq!(material.to_array()[..3], [0.2, 0.3, 0.4]);
}
