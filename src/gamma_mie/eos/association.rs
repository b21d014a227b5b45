use num_dual::DualNum;

/// Coefficients of the association integral,
/// $I_{kl}=\sum_{n=0}^{10}\sum_{m=0}^{10-n}C_{nm}\left(\rho_s\sigma_x^3\right)^n\left(\frac{T}{\varepsilon_{kl}}\right)^m$.
const C: [[f64; 11]; 11] = [
    [
        0.0756425183020431,
        -0.128667137050961,
        0.128350632316055,
        -0.0725321780970292,
        0.0257782547511452,
        -0.00601170055221687,
        0.000933363147191978,
        -9.55607377143667e-05,
        6.19576039900837e-06,
        -2.30466608213628e-07,
        3.74605718435540e-09,
    ],
    [
        0.134228218276565,
        -0.182682168504886,
        0.0771662412959262,
        -0.000717458641164565,
        -0.00872427344283170,
        0.00297971836051287,
        -0.000484863997651451,
        4.35262491516424e-05,
        -2.07789181640066e-06,
        4.13749349344802e-08,
        0.0,
    ],
    [
        -0.565116428942893,
        1.00930692226792,
        -0.660166945915607,
        0.214492212294301,
        -0.0388462990166792,
        0.00406016982985030,
        -0.000239515566373142,
        7.25488368831468e-06,
        -8.58904640281928e-08,
        0.0,
        0.0,
    ],
    [
        -0.387336382687019,
        -0.211614570109503,
        0.450442894490509,
        -0.176931752538907,
        0.0317171522104923,
        -0.00291368915845693,
        0.000130193710011706,
        -2.14505500786531e-06,
        0.0,
        0.0,
        0.0,
    ],
    [
        2.13713180911797,
        -2.02798460133021,
        0.336709255682693,
        0.00118106507393722,
        -0.00600058423301506,
        0.000626343952584415,
        -2.03636395699819e-05,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        -0.300527494795524,
        2.89920714512243,
        -0.567134839686498,
        0.0518085125423494,
        -0.00239326776760414,
        4.15107362643844e-05,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        -6.21028065719194,
        -1.92883360342573,
        0.284109761066570,
        -0.0157606767372364,
        0.000368599073256615,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        11.6083532818029,
        0.742215544511197,
        -0.0823976531246117,
        0.00186167650098254,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        -10.2632535542427,
        -0.125035689035085,
        0.0114299144831867,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        4.65297446837297,
        -0.00192518067137033,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        -0.867296219639940,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
];

/// Association integral of a bead pair for the reduced segment density
/// $\rho_s\sigma_x^3$ and the reduced temperature $T/\varepsilon_{kl}$.
pub fn association_integral<D: DualNum<f64> + Copy>(
    reduced_density: D,
    reduced_temperature: D,
) -> D {
    let mut integral = D::zero();
    let mut rho_n = D::one();
    for (n, c) in C.iter().enumerate() {
        let mut inner = D::zero();
        let mut t_m = D::one();
        for &cm in c.iter().take(11 - n) {
            inner += t_m * cm;
            t_m *= reduced_temperature;
        }
        integral += inner * rho_n;
        rho_n *= reduced_density;
    }
    integral
}
