use crate::data_structures::model;

/**
 * Converts the models produced by `tobj` into CPU meshes.
 *
 * Obj files often come without normals so they are calculated from the triangles
 * when missing. Meshes that fail validation are returned as errors so the caller
 * can skip them without dropping the whole file.
 */
pub fn load_meshes(models: &[tobj::Model], file_name: &str) -> Vec<anyhow::Result<model::Mesh>> {
    models
        .iter()
        .map(|m| {
            let positions = m
                .mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect::<Vec<_>>();
            let normals = m
                .mesh
                .normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect::<Vec<_>>();
            // Obj has its texture origin in the bottom left corner
            let tex_coords = m
                .mesh
                .texcoords
                .chunks_exact(2)
                .map(|t| [t[0], 1.0 - t[1]])
                .collect::<Vec<_>>();

            let name = if m.name.is_empty() {
                file_name.to_string()
            } else {
                m.name.clone()
            };
            let mut mesh = model::Mesh {
                name,
                positions,
                normals,
                tex_coords,
                // The indices are for positions, texels, and normals because we set `single_index` to true
                indices: m.mesh.indices.clone(),
                material: m.mesh.material_id,
            };
            mesh.validate()?;
            mesh.ensure_normals();
            Ok(mesh)
        })
        .collect::<Vec<_>>()
}

pub fn load_materials(materials: &[tobj::Material]) -> Vec<model::Material> {
    materials
        .iter()
        .map(|m| {
            let [r, g, b] = m.diffuse.unwrap_or([0.8, 0.8, 0.8]);
            let alpha = m.dissolve.unwrap_or(1.0);
            // Phong exponent to an approximate roughness
            let roughness = m
                .shininess
                .map(|ns| 1.0 - (ns / 1000.0).sqrt())
                .unwrap_or(1.0);
            let mut material = model::Material::new(&m.name);
            material.base_color = [r, g, b, alpha];
            material.roughness = roughness;
            material
        })
        .collect()
}
