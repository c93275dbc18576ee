use bevy::prelude::*;

use simulation::config::{CAR_BODY_HEIGHT, CAR_BODY_LENGTH, CAR_BODY_WIDTH};
use simulation::vehicle::{Vehicle, VehicleOrientation, VehiclePosition, VehicleStyle};

#[derive(Component)]
pub struct VehicleBody;

/// Body mesh shared by every car; created on first use.
#[derive(Resource, Default)]
pub struct VehicleMeshCache {
    body: Option<Handle<Mesh>>,
}

impl VehicleMeshCache {
    fn body(&mut self, meshes: &mut Assets<Mesh>) -> Handle<Mesh> {
        self.body
            .get_or_insert_with(|| {
                meshes.add(Cuboid::new(CAR_BODY_WIDTH, CAR_BODY_HEIGHT, CAR_BODY_LENGTH))
            })
            .clone()
    }
}

pub fn vehicle_transform(position: &VehiclePosition, orientation: &VehicleOrientation) -> Transform {
    Transform::from_translation(position.0).with_rotation(orientation.0)
}

#[allow(clippy::type_complexity)]
pub fn attach_vehicle_meshes(
    mut commands: Commands,
    query: Query<
        (Entity, &VehiclePosition, &VehicleOrientation, &VehicleStyle),
        (With<Vehicle>, Without<VehicleBody>),
    >,
    mut cache: ResMut<VehicleMeshCache>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (entity, position, orientation, style) in &query {
        let material = materials.add(StandardMaterial {
            base_color: style.color,
            perceptual_roughness: 0.5,
            ..default()
        });
        commands.entity(entity).insert((
            VehicleBody,
            Mesh3d(cache.body(&mut meshes)),
            MeshMaterial3d(material),
            vehicle_transform(position, orientation),
            Visibility::default(),
        ));
    }
}

pub fn sync_vehicle_transforms(
    mut query: Query<
        (&VehiclePosition, &VehicleOrientation, &mut Transform),
        (With<VehicleBody>, Changed<VehiclePosition>),
    >,
) {
    for (position, orientation, mut transform) in &mut query {
        *transform = vehicle_transform(position, orientation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::sim_config::SimConfig;
    use simulation::world_init::spawn_vehicle;

    fn headless_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<Assets<Mesh>>();
        app.init_resource::<Assets<StandardMaterial>>();
        app.init_resource::<VehicleMeshCache>();
        app.add_systems(Update, (attach_vehicle_meshes, sync_vehicle_transforms).chain());
        app
    }

    fn spawn_stock(app: &mut App) {
        let specs = SimConfig::default().validate().unwrap();
        let world = app.world_mut();
        let mut commands = world.commands();
        for spec in specs {
            spawn_vehicle(&mut commands, spec);
        }
        world.flush();
    }

    #[test]
    fn test_every_car_gets_one_shared_body_mesh() {
        let mut app = headless_app();
        spawn_stock(&mut app);
        app.update();

        let world = app.world_mut();
        let meshes: Vec<Handle<Mesh>> = world
            .query_filtered::<&Mesh3d, With<VehicleBody>>()
            .iter(world)
            .map(|mesh| mesh.0.clone())
            .collect();
        assert_eq!(meshes.len(), 4);
        assert!(meshes.iter().all(|mesh| *mesh == meshes[0]));
        assert_eq!(world.resource::<Assets<Mesh>>().len(), 1);
    }

    #[test]
    fn test_transform_follows_position() {
        let mut app = headless_app();
        spawn_stock(&mut app);
        app.update();

        let world = app.world_mut();
        let entity = world
            .query_filtered::<Entity, With<VehicleBody>>()
            .iter(world)
            .next()
            .unwrap();
        world
            .get_mut::<VehiclePosition>(entity)
            .unwrap()
            .0 = Vec3::new(0.5, 0.25, 3.0);
        app.update();

        let transform = app.world().get::<Transform>(entity).unwrap();
        assert_eq!(transform.translation, Vec3::new(0.5, 0.25, 3.0));
        let orientation = app.world().get::<VehicleOrientation>(entity).unwrap();
        assert_eq!(transform.rotation, orientation.0);
    }
}
